//! Session time aggregation
//!
//! Sums per-frame elapsed time into the totals persisted for a study session.
//! Each frame's `dt` covers the interval since the previous frame, so it is
//! attributed to the state and active signals reported on that previous frame.
//!
//! - focused / unfocused time accrues while the session is calibrating or
//!   tracking, split by the focus flag
//! - paused time accrues while paused
//! - habit time accrues per latched category, never while paused
//! - nothing accrues once the session has ended

use crate::error::FocusError;
use crate::types::{ActiveSignals, FocusSessionState, FrameReport, SignalCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SECS_PER_HOUR: f64 = 3600.0;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Session totals in the backend's persisted shape.
///
/// Durations are seconds, except `total_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    /// `HH:MM` (UTC)
    pub time_started: String,
    pub total_hours: f64,
    /// Number of pauses taken
    pub intervals: u32,
    pub time_hair: f64,
    pub time_nail: f64,
    pub time_eye: f64,
    pub time_nose: f64,
    pub time_unfocused: f64,
    pub time_paused: f64,
}

impl SessionRecord {
    /// Seconds attributed to one habit category
    pub fn habit_secs(&self, category: SignalCategory) -> f64 {
        match category {
            SignalCategory::EyeRubbing => self.time_eye,
            SignalCategory::NoseRubbing => self.time_nose,
            SignalCategory::NailBiting => self.time_nail,
            SignalCategory::HairTouching => self.time_hair,
        }
    }

    pub fn to_json(&self) -> Result<String, FocusError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FocusError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Copy)]
struct Attribution {
    state: FocusSessionState,
    focused: bool,
    active: ActiveSignals,
}

/// Running totals for one session
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    focused_secs: f64,
    unfocused_secs: f64,
    paused_secs: f64,
    habit_secs: [f64; 4],
    intervals: u32,
    last: Option<Attribution>,
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAggregator {
    /// Start a session now with a fresh id
    pub fn new() -> Self {
        Self::with_start(Uuid::new_v4(), Utc::now())
    }

    pub fn with_start(session_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            started_at,
            focused_secs: 0.0,
            unfocused_secs: 0.0,
            paused_secs: 0.0,
            habit_secs: [0.0; 4],
            intervals: 0,
            last: None,
        }
    }

    /// Fold one frame report into the totals
    pub fn accrue(&mut self, report: &FrameReport) {
        let dt = if report.dt.is_finite() {
            report.dt.max(0.0)
        } else {
            0.0
        };

        if let Some(prev) = self.last {
            match prev.state {
                FocusSessionState::Ended => {}
                FocusSessionState::Paused => self.paused_secs += dt,
                _ => {
                    if prev.focused {
                        self.focused_secs += dt;
                    } else {
                        self.unfocused_secs += dt;
                    }
                    for category in prev.active.iter() {
                        self.habit_secs[category.index()] += dt;
                    }
                }
            }

            if report.state == FocusSessionState::Paused
                && prev.state != FocusSessionState::Paused
            {
                self.intervals += 1;
            }
        }

        self.last = Some(Attribution {
            state: report.state,
            focused: report.focused,
            active: report.active,
        });
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn focused_secs(&self) -> f64 {
        self.focused_secs
    }

    pub fn unfocused_secs(&self) -> f64 {
        self.unfocused_secs
    }

    pub fn paused_secs(&self) -> f64 {
        self.paused_secs
    }

    pub fn habit_secs(&self, category: SignalCategory) -> f64 {
        self.habit_secs[category.index()]
    }

    pub fn intervals(&self) -> u32 {
        self.intervals
    }

    /// Build the record for the totals accrued so far
    pub fn finish(&self) -> SessionRecord {
        let total_secs = self.focused_secs + self.unfocused_secs + self.paused_secs;
        let habit = |c: SignalCategory| round2(self.habit_secs(c));

        SessionRecord {
            session_id: self.session_id.to_string(),
            date: self.started_at.format("%Y-%m-%d").to_string(),
            time_started: self.started_at.format("%H:%M").to_string(),
            total_hours: round2(total_secs / SECS_PER_HOUR),
            intervals: self.intervals,
            time_hair: habit(SignalCategory::HairTouching),
            time_nail: habit(SignalCategory::NailBiting),
            time_eye: habit(SignalCategory::EyeRubbing),
            time_nose: habit(SignalCategory::NoseRubbing),
            time_unfocused: round2(self.unfocused_secs),
            time_paused: round2(self.paused_secs),
        }
    }
}
