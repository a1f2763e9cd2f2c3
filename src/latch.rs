//! Hysteresis latch
//!
//! Debounces a noisy per-frame boolean into a stable on/off signal. The latch
//! turns on only after the raw condition has been continuously true for
//! `on_hold` seconds, and turns off only after it has been continuously false
//! for `off_hold` seconds. A pending timer restarts whenever the raw condition
//! flips back before the hold elapses.
//!
//! The timer arms on the first frame of a run; the transition fires on a later
//! frame once the elapsed time reaches the hold. A hold of zero therefore
//! still needs two consecutive frames.
//!
//! Elapsed-time comparisons allow [`TIME_EPSILON`] of slack so that decimal
//! frame timestamps landing exactly on a hold boundary fire on that frame.

use crate::config::LatchConfig;

/// Slack for elapsed-time boundary checks, in seconds
pub const TIME_EPSILON: f64 = 1e-9;

/// Whether `now - start` has reached `limit`, within [`TIME_EPSILON`]
pub fn elapsed_reaches(start: f64, now: f64, limit: f64) -> bool {
    now - start + TIME_EPSILON >= limit
}

/// Debounced output of a latch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    Off,
    On,
}

/// Time-based on/off debouncer
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisLatch {
    on_hold: f64,
    off_hold: f64,
    active: bool,
    /// Start of the pending run that disagrees with `active`
    since: Option<f64>,
}

impl HysteresisLatch {
    pub fn new(on_hold: f64, off_hold: f64) -> Self {
        Self {
            on_hold,
            off_hold,
            active: false,
            since: None,
        }
    }

    pub fn from_config(config: &LatchConfig) -> Self {
        Self::new(config.on_hold_secs, config.off_hold_secs)
    }

    /// Feed one frame's raw condition. Returns whether the latch flipped on
    /// this call; the debounced value is available from [`active`].
    ///
    /// [`active`]: HysteresisLatch::active
    pub fn update(&mut self, condition: bool, now: f64) -> bool {
        if condition == self.active {
            // Agreeing frame cancels any pending transition
            self.since = None;
            return false;
        }

        let hold = if self.active {
            self.off_hold
        } else {
            self.on_hold
        };

        match self.since {
            None => {
                self.since = Some(now);
                false
            }
            Some(start) if elapsed_reaches(start, now, hold) => {
                self.active = condition;
                self.since = None;
                true
            }
            Some(_) => false,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> LatchState {
        if self.active {
            LatchState::On
        } else {
            LatchState::Off
        }
    }

    /// Timestamp at which the current pending run started, if any
    pub fn pending_since(&self) -> Option<f64> {
        self.since
    }

    /// Force the latch off and drop any pending timer
    pub fn reset(&mut self) {
        self.active = false;
        self.since = None;
    }
}

impl Default for HysteresisLatch {
    fn default() -> Self {
        Self::from_config(&LatchConfig::default())
    }
}
