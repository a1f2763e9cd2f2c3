//! Lifetime user record
//!
//! Rolls finished sessions into per-user totals. Habit, unfocused and paused
//! durations arrive as seconds and are stored as hours, each rounded to two
//! decimals as it is added.

use crate::error::FocusError;
use crate::session::{round2, SessionRecord};
use serde::{Deserialize, Serialize, Serializer};

const SECS_PER_HOUR: f64 = 3600.0;

fn serialize_hours<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// Per-user lifetime totals (hours)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default, serialize_with = "serialize_hours")]
    pub total_hours: f64,
    #[serde(default)]
    pub total_intervals: u32,
    #[serde(default, serialize_with = "serialize_hours")]
    pub time_hair: f64,
    #[serde(default, serialize_with = "serialize_hours")]
    pub time_nail: f64,
    #[serde(default, serialize_with = "serialize_hours")]
    pub time_eye: f64,
    #[serde(default, serialize_with = "serialize_hours")]
    pub time_nose: f64,
    #[serde(default, serialize_with = "serialize_hours")]
    pub time_unfocused: f64,
    #[serde(default, serialize_with = "serialize_hours")]
    pub time_paused: f64,
}

impl UserRecord {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Add one finished session
    pub fn absorb(&mut self, session: &SessionRecord) {
        let hours = |secs: f64| round2(secs / SECS_PER_HOUR);

        self.total_sessions += 1;
        self.total_hours += session.total_hours;
        self.total_intervals += session.intervals;
        self.time_hair += hours(session.time_hair);
        self.time_nail += hours(session.time_nail);
        self.time_eye += hours(session.time_eye);
        self.time_nose += hours(session.time_nose);
        self.time_unfocused += hours(session.time_unfocused);
        self.time_paused += hours(session.time_paused);
    }

    pub fn to_json(&self) -> Result<String, FocusError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FocusError> {
        Ok(serde_json::from_str(json)?)
    }
}
