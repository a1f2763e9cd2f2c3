//! Frame sources over recorded landmark streams
//!
//! Commands embedded in a recording are posted to the UI mailbox as the frame
//! carrying them is delivered, the same way a live UI callback would post them
//! between frames.

use crate::error::FocusError;
use crate::mailbox::UiEvents;
use crate::runner::LandmarkSource;
use crate::schema::adapter::FrameAdapter;
use crate::schema::frame::{RawCommand, RawFrame};
use crate::types::TimedFrame;
use std::io::BufRead;

/// Route a recorded command to the matching mailbox slot
pub fn post_command(events: &UiEvents, command: RawCommand) {
    match command {
        RawCommand::Recalibrate => events.request_recalibration(),
        RawCommand::Quit => events.request_quit(),
        other => {
            if let Some(command) = other.as_user_command() {
                events.post(command);
            }
        }
    }
}

/// Replays an in-memory, already validated recording
pub struct ReplaySource {
    frames: std::vec::IntoIter<RawFrame>,
    events: UiEvents,
}

impl ReplaySource {
    pub fn new(frames: Vec<RawFrame>, events: UiEvents) -> Self {
        Self {
            frames: frames.into_iter(),
            events,
        }
    }

    /// Parse and validate an NDJSON recording
    pub fn from_ndjson(ndjson: &str, events: UiEvents) -> Result<Self, FocusError> {
        let frames = FrameAdapter::parse_ndjson(ndjson)?;
        FrameAdapter::check_frames(&frames)?;
        Ok(Self::new(frames, events))
    }

    /// Frames not yet delivered
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, FocusError> {
        Ok(self.frames.next().map(|frame| {
            if let Some(command) = frame.command {
                post_command(&self.events, command);
            }
            FrameAdapter::to_timed_frame(&frame)
        }))
    }
}

/// Streams frames lazily from a reader such as stdin.
///
/// Read errors, malformed lines and out-of-order timestamps are fatal.
pub struct NdjsonSource<R> {
    reader: R,
    events: UiEvents,
    line_num: usize,
    last_timestamp: Option<f64>,
}

impl<R: BufRead> NdjsonSource<R> {
    pub fn new(reader: R, events: UiEvents) -> Self {
        Self {
            reader,
            events,
            line_num: 0,
            last_timestamp: None,
        }
    }
}

impl<R: BufRead> LandmarkSource for NdjsonSource<R> {
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, FocusError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).map_err(|e| {
                FocusError::SourceFailed(format!("read failed after line {}: {e}", self.line_num))
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_num += 1;

            let Some(frame) = FrameAdapter::parse_line(&line, self.line_num)
                .map_err(|e| FocusError::SourceFailed(e.to_string()))?
            else {
                continue;
            };

            frame.validate().map_err(|e| {
                FocusError::SourceFailed(format!("invalid frame on line {}: {e}", self.line_num))
            })?;
            if let Some(previous) = self.last_timestamp {
                if frame.timestamp < previous {
                    return Err(FocusError::SourceFailed(format!(
                        "timestamp went backwards on line {}: {} after {previous}",
                        self.line_num, frame.timestamp
                    )));
                }
            }
            self.last_timestamp = Some(frame.timestamp);

            if let Some(command) = frame.command {
                post_command(&self.events, command);
            }
            return Ok(Some(FrameAdapter::to_timed_frame(&frame)));
        }
    }
}
