//! focus.landmark_frame.v1 schema definition
//!
//! One JSON object per captured video frame:
//! - `timestamp`: monotonic capture time in seconds
//! - `face`: face mesh landmarks, absent when no face was found
//! - `hands`: zero or more 21-point hand landmark sets
//! - `image`: optional source dimensions for pixel-space distances
//! - `command`: optional UI input delivered alongside the frame

use crate::types::{ImageSize, LandmarkFrame, Point, UserCommand};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Current schema version
pub const SCHEMA_VERSION: &str = "focus.landmark_frame.v1";

/// UI input recorded with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawCommand {
    Continue,
    End,
    Recalibrate,
    Quit,
}

impl RawCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawCommand::Continue => "continue",
            RawCommand::End => "end",
            RawCommand::Recalibrate => "recalibrate",
            RawCommand::Quit => "quit",
        }
    }

    /// The pause-overlay command this maps to, if any
    pub fn as_user_command(&self) -> Option<UserCommand> {
        match self {
            RawCommand::Continue => Some(UserCommand::Continue),
            RawCommand::End => Some(UserCommand::End),
            RawCommand::Recalibrate | RawCommand::Quit => None,
        }
    }
}

impl FromStr for RawCommand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(RawCommand::Continue),
            "end" => Ok(RawCommand::End),
            "recalibrate" => Ok(RawCommand::Recalibrate),
            "quit" => Ok(RawCommand::Quit),
            other => Err(ValidationError::UnknownCommand(other.to_string())),
        }
    }
}

/// A single recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Schema version (must be "focus.landmark_frame.v1")
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<Vec<Point>>,
    #[serde(default)]
    pub hands: Vec<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<RawCommand>,
}

impl RawFrame {
    /// Wrap a landmark frame for recording
    pub fn new(timestamp: f64, frame: LandmarkFrame) -> Self {
        RawFrame {
            schema_version: SCHEMA_VERSION.to_string(),
            frame_id: None,
            timestamp,
            face: frame.face,
            hands: frame.hands,
            image: frame.image_size,
            command: None,
        }
    }

    pub fn with_command(mut self, command: RawCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Validate a single frame in isolation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if !(self.timestamp.is_finite() && self.timestamp >= 0.0) {
            return Err(ValidationError::InvalidTimestamp(self.timestamp));
        }

        if let Some(face) = &self.face {
            check_points("face", face)?;
        }
        for (idx, hand) in self.hands.iter().enumerate() {
            check_points(&format!("hands[{idx}]"), hand)?;
        }

        if let Some(image) = self.image {
            let valid = |v: f64| v.is_finite() && v > 0.0;
            if !(valid(image.width) && valid(image.height)) {
                return Err(ValidationError::InvalidImageSize {
                    width: image.width,
                    height: image.height,
                });
            }
        }

        Ok(())
    }

    /// Detections carried by this frame
    pub fn to_landmark_frame(&self) -> LandmarkFrame {
        LandmarkFrame {
            face: self.face.clone(),
            hands: self.hands.clone(),
            image_size: self.image,
        }
    }
}

fn check_points(part: &str, points: &[Point]) -> Result<(), ValidationError> {
    match points
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        Some(index) => Err(ValidationError::NonFiniteCoordinate {
            part: part.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

/// Validation errors for recorded frames
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Invalid timestamp: {0} (must be finite and non-negative)")]
    InvalidTimestamp(f64),

    #[error("Non-finite coordinate in {part} at landmark {index}")]
    NonFiniteCoordinate { part: String, index: usize },

    #[error("Invalid image size {width}x{height}")]
    InvalidImageSize { width: f64, height: f64 },

    #[error("Timestamp went backwards: {current} after {previous}")]
    TimestampRegression { previous: f64, current: f64 },

    #[error("Unknown command: {0} (expected continue, end, recalibrate or quit)")]
    UnknownCommand(String),
}
