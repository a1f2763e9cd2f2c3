//! Adapter for parsing and validating focus.landmark_frame.v1 streams

use crate::error::FocusError;
use crate::features::MAX_HANDS;
use crate::schema::frame::*;
use crate::types::TimedFrame;
use tracing::warn;

/// Adapter for converting recorded frames into pipeline input
pub struct FrameAdapter;

impl FrameAdapter {
    /// Parse a JSON string containing an array of RawFrames
    pub fn parse_array(json: &str) -> Result<Vec<RawFrame>, FocusError> {
        let frames: Vec<RawFrame> = serde_json::from_str(json)?;
        Ok(frames)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawFrames
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawFrame>, FocusError> {
        let mut frames = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            if let Some(frame) = Self::parse_line(line, line_num + 1)? {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    /// Parse one NDJSON line; blank lines yield `None`
    pub fn parse_line(line: &str, line_num: usize) -> Result<Option<RawFrame>, FocusError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<RawFrame>(trimmed)
            .map(Some)
            .map_err(|e| FocusError::ParseError(format!("Failed to parse line {line_num}: {e}")))
    }

    /// Validate a batch of frames, including timestamp ordering across the batch
    pub fn validate_frames(frames: &[RawFrame]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous: Option<f64> = None;

        for (idx, frame) in frames.iter().enumerate() {
            let mut error = frame.validate().err();
            if error.is_none() {
                if let Some(prev) = previous {
                    if frame.timestamp < prev {
                        error = Some(ValidationError::TimestampRegression {
                            previous: prev,
                            current: frame.timestamp,
                        });
                    }
                }
                previous = Some(frame.timestamp);
            }

            if error.is_some() {
                results.push(ValidationResult {
                    index: idx,
                    frame_id: frame.frame_id.clone(),
                    result: error,
                });
            }
        }

        results
    }

    /// Validate a batch and fail on the first problem
    pub fn check_frames(frames: &[RawFrame]) -> Result<(), FocusError> {
        match Self::validate_frames(frames).into_iter().next() {
            Some(ValidationResult {
                index,
                result: Some(err),
                ..
            }) => Err(FocusError::InvalidFrame(format!("frame {index}: {err}"))),
            _ => Ok(()),
        }
    }

    /// Convert a validated frame into pipeline input
    pub fn to_timed_frame(frame: &RawFrame) -> TimedFrame {
        let mut landmarks = frame.to_landmark_frame();
        if landmarks.hands.len() > MAX_HANDS {
            warn!(
                hands = landmarks.hands.len(),
                timestamp = frame.timestamp,
                "ignoring hands beyond the first two"
            );
            landmarks.hands.truncate(MAX_HANDS);
        }
        TimedFrame::new(frame.timestamp, landmarks)
    }
}

/// Result of frame validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub frame_id: Option<String>,
    pub result: Option<ValidationError>,
}
