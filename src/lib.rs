//! Synheart Focus - On-device focus and habit tracking from face and hand landmarks
//!
//! Focus turns per-frame face mesh and hand landmarks into debounced habit
//! signals and a focus/pause session lifecycle through a deterministic
//! pipeline: feature extraction → signal detection → eye calibration and focus
//! tracking → session aggregation.
//!
//! ## Modules
//!
//! - **Per-frame pipeline**: [`FocusProcessor`] turns one landmark frame into a [`FrameReport`]
//! - **Session loop**: [`SessionRunner`] drives a [`LandmarkSource`] with UI commands from [`UiEvents`]
//! - **Records**: [`SessionRecord`] per session, [`UserRecord`] lifetime totals

pub mod calibration;
pub mod config;
pub mod error;
pub mod features;
pub mod focus;
pub mod geometry;
pub mod latch;
pub mod mailbox;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod schema;
pub mod session;
pub mod signals;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use error::FocusError;
pub use mailbox::{Inbox, UiEvents};
pub use pipeline::{replay, replay_to_record, FocusProcessor};
pub use record::UserRecord;
pub use runner::{FrameObserver, LandmarkSource, SessionOutcome, SessionRunner, StopReason};
pub use session::{SessionAggregator, SessionRecord};
pub use types::{
    FocusSessionState, FrameReport, LandmarkFrame, Point, SignalCategory, UserCommand,
};

// Schema exports
pub use schema::{FrameAdapter, NdjsonSource, RawFrame, ReplaySource, SCHEMA_VERSION};

/// Focus library version
pub const FOCUS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI doctor
pub const PRODUCER_NAME: &str = "synheart-focus";
