//! Unified focus.landmark_frame.v1 schema
//!
//! This module defines the recorded input format for landmark streams, the
//! adapter that parses and validates it, and the frame sources that replay it
//! through the session loop.

mod adapter;
mod frame;
mod replay;

pub use adapter::*;
pub use frame::*;
pub use replay::*;
