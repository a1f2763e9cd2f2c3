//! Session focus state machine
//!
//! Tracks whether the user is looking at the screen, pauses the session after a
//! sustained stretch of inattention, and waits for the user to continue or end.
//!
//! Focus confirmation is frame-count based (`focus_frames` open-eye frames in a
//! row to become focused, `unfocus_frames` misses in a row to drop focus) while
//! the pause limit is measured in seconds. The unfocused timer starts on the
//! first miss frame whenever the user is not already focused, so time spent
//! debouncing toward "not focused" counts toward the pause limit.

use crate::calibration::CalibrationModule;
use crate::config::{EngineConfig, FocusConfig};
use crate::latch::elapsed_reaches;
use crate::types::{EyeMeasurement, FocusSessionState, UserCommand};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Paused,
    Ended,
}

/// Outcome of one state machine step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusUpdate {
    pub previous: FocusSessionState,
    pub state: FocusSessionState,
    /// Command honored on this frame
    pub command: Option<UserCommand>,
    /// Threshold derived on this frame, if calibration just finished
    pub calibrated: Option<f64>,
}

impl FocusUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.state
    }
}

/// Calibrating / tracking / paused / ended lifecycle for one session
#[derive(Debug, Clone)]
pub struct FocusStateMachine {
    config: FocusConfig,
    calibration: CalibrationModule,
    phase: Phase,
    focused: bool,
    focus_count: u32,
    miss_count: u32,
    unfocused_since: Option<f64>,
    pause_count: u32,
}

impl FocusStateMachine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.focus,
            calibration: CalibrationModule::new(config.calibration),
            phase: Phase::Active,
            focused: false,
            focus_count: 0,
            miss_count: 0,
            unfocused_since: None,
            pause_count: 0,
        }
    }

    /// Current session state
    pub fn state(&self) -> FocusSessionState {
        match self.phase {
            Phase::Ended => FocusSessionState::Ended,
            Phase::Paused => FocusSessionState::Paused,
            Phase::Active if !self.calibration.is_calibrated() => FocusSessionState::Calibrating,
            Phase::Active if self.focused => FocusSessionState::TrackingFocused,
            Phase::Active => FocusSessionState::TrackingUnfocused,
        }
    }

    /// Process one frame.
    ///
    /// `eyes` is `None` when either eye was not measurable. `command` is only
    /// honored when the session is paused at the start of the frame; otherwise
    /// it is discarded.
    pub fn update(
        &mut self,
        eyes: Option<EyeMeasurement>,
        now: f64,
        command: Option<UserCommand>,
    ) -> FocusUpdate {
        let previous = self.state();
        let mut update = FocusUpdate {
            previous,
            state: previous,
            command: None,
            calibrated: None,
        };

        if self.phase == Phase::Ended {
            return update;
        }

        update.calibrated = self.calibration.observe(now, eyes);

        if self.phase == Phase::Paused {
            self.reset_tracking();
            match command {
                Some(UserCommand::Continue) => {
                    self.phase = Phase::Active;
                    update.command = command;
                    info!(timestamp = now, "session resumed");
                }
                Some(UserCommand::End) => {
                    self.phase = Phase::Ended;
                    update.command = command;
                    info!(timestamp = now, pauses = self.pause_count, "session ended");
                }
                None => {}
            }
            update.state = self.state();
            return update;
        }

        if let Some(command) = command {
            debug!(?command, state = previous.as_str(), "discarding command outside pause");
        }

        self.track(eyes, now);
        update.state = self.state();
        update
    }

    fn track(&mut self, eyes: Option<EyeMeasurement>, now: f64) {
        let threshold = self.calibration.threshold();
        let open = eyes.is_some_and(|e| e.both_open(threshold));

        if open {
            self.focus_count += 1;
            self.miss_count = 0;
            if !self.focused && self.focus_count >= self.config.focus_frames {
                self.focused = true;
            }
            self.unfocused_since = None;
        } else {
            self.miss_count += 1;
            self.focus_count = 0;
            if self.focused && self.miss_count >= self.config.unfocus_frames {
                self.focused = false;
                self.unfocused_since = Some(now);
            } else if !self.focused && self.unfocused_since.is_none() {
                self.unfocused_since = Some(now);
            }
        }

        if let Some(since) = self.unfocused_since {
            if elapsed_reaches(since, now, self.config.pause_after_secs) {
                self.phase = Phase::Paused;
                self.pause_count += 1;
                self.reset_tracking();
                info!(
                    timestamp = now,
                    unfocused_secs = now - since,
                    pauses = self.pause_count,
                    "session paused after sustained inattention"
                );
            }
        }
    }

    fn reset_tracking(&mut self) {
        self.focused = false;
        self.focus_count = 0;
        self.miss_count = 0;
        self.unfocused_since = None;
    }

    /// Restart calibration and focus debouncing. Paused and ended sessions stay
    /// paused or ended.
    pub fn recalibrate(&mut self, now: f64) {
        if self.phase == Phase::Ended {
            return;
        }
        self.calibration.reset(now);
        self.reset_tracking();
        debug!(timestamp = now, "recalibration requested");
    }

    pub fn is_focused(&self) -> bool {
        self.phase == Phase::Active && self.focused
    }

    /// Seconds of continuous unfocus counted toward the pause limit
    pub fn unfocused_secs(&self, now: f64) -> Option<f64> {
        match self.phase {
            Phase::Active => self.unfocused_since.map(|since| now - since),
            _ => None,
        }
    }

    /// Open-eye threshold currently applied
    pub fn ear_threshold(&self) -> f64 {
        self.calibration.threshold()
    }

    pub fn calibration(&self) -> &CalibrationModule {
        &self.calibration
    }

    /// Number of times the session has entered the paused state
    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    pub fn focus_count(&self) -> u32 {
        self.focus_count
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const OPEN: Option<EyeMeasurement> = Some(EyeMeasurement {
        left_ear: 0.3,
        right_ear: 0.3,
    });
    const CLOSED: Option<EyeMeasurement> = Some(EyeMeasurement {
        left_ear: 0.1,
        right_ear: 0.1,
    });

    fn machine() -> FocusStateMachine {
        FocusStateMachine::new(&EngineConfig::default())
    }

    /// Run through the calibration window with open eyes
    fn calibrated_machine() -> FocusStateMachine {
        let mut fsm = machine();
        fsm.update(OPEN, 0.0, None);
        fsm.update(OPEN, 3.5, None);
        assert!(fsm.calibration().is_calibrated());
        fsm
    }

    #[test]
    fn test_initial_state_is_calibrating() {
        let fsm = machine();
        assert_eq!(fsm.state(), FocusSessionState::Calibrating);
        assert_eq!(fsm.ear_threshold(), 0.23);
    }

    #[test]
    fn test_calibration_completion_switches_to_tracking() {
        let mut fsm = machine();
        fsm.update(OPEN, 0.0, None);
        let update = fsm.update(OPEN, 3.5, None);
        assert_eq!(update.previous, FocusSessionState::Calibrating);
        assert_eq!(update.state, FocusSessionState::TrackingUnfocused);
        assert!((update.calibrated.unwrap() - 0.255).abs() < 1e-12);
    }

    #[test]
    fn test_focused_on_fifth_open_frame() {
        let mut fsm = calibrated_machine();
        // The calibration frame was open too; force a miss to restart the count
        fsm.update(None, 3.75, None);
        for i in 1..=4 {
            let update = fsm.update(OPEN, 4.0 + i as f64 * 0.125, None);
            assert_eq!(update.state, FocusSessionState::TrackingUnfocused, "frame {i}");
        }
        let update = fsm.update(OPEN, 5.0, None);
        assert_eq!(update.state, FocusSessionState::TrackingFocused);
        assert!(fsm.is_focused());
    }

    #[test]
    fn test_focus_decisions_run_before_calibration() {
        let mut fsm = machine();
        for i in 0..5 {
            fsm.update(OPEN, i as f64 * 0.125, None);
        }
        assert!(fsm.is_focused());
        assert_eq!(fsm.state(), FocusSessionState::Calibrating);
    }

    #[test]
    fn test_drops_focus_after_eight_misses() {
        let mut fsm = calibrated_machine();
        for i in 0..5 {
            fsm.update(OPEN, 4.0 + i as f64 * 0.125, None);
        }
        assert!(fsm.is_focused());

        for i in 1..=7 {
            fsm.update(CLOSED, 5.0 + i as f64 * 0.125, None);
            assert!(fsm.is_focused(), "miss {i}");
            assert_eq!(fsm.unfocused_secs(6.0), None);
        }
        let update = fsm.update(CLOSED, 6.0, None);
        assert_eq!(update.state, FocusSessionState::TrackingUnfocused);
        assert_eq!(fsm.unfocused_secs(6.5), Some(0.5));
    }

    #[test]
    fn test_pauses_thirty_seconds_after_first_unfocused_frame() {
        let mut fsm = calibrated_machine();
        // Not focused yet: the timer arms on the first miss frame
        fsm.update(CLOSED, 4.0, None);
        assert_eq!(fsm.unfocused_secs(4.0), Some(0.0));

        let mut t = 4.0;
        while t < 33.875 {
            t += 0.125;
            let update = fsm.update(CLOSED, t, None);
            assert_eq!(update.state, FocusSessionState::TrackingUnfocused, "t={t}");
        }
        let update = fsm.update(None, 34.0, None);
        assert_eq!(update.previous, FocusSessionState::TrackingUnfocused);
        assert_eq!(update.state, FocusSessionState::Paused);
        assert_eq!(fsm.pause_count(), 1);
        assert_eq!(fsm.unfocused_secs(34.0), None);
    }

    #[test]
    fn test_open_frame_clears_unfocused_timer() {
        let mut fsm = calibrated_machine();
        fsm.update(CLOSED, 4.0, None);
        fsm.update(OPEN, 20.0, None);
        assert_eq!(fsm.unfocused_secs(20.0), None);
        fsm.update(CLOSED, 21.0, None);
        let update = fsm.update(CLOSED, 40.0, None);
        assert_eq!(update.state, FocusSessionState::TrackingUnfocused);
    }

    fn paused_machine() -> FocusStateMachine {
        let mut fsm = calibrated_machine();
        fsm.update(CLOSED, 4.0, None);
        fsm.update(CLOSED, 34.0, None);
        assert_eq!(fsm.state(), FocusSessionState::Paused);
        fsm
    }

    #[test]
    fn test_paused_holds_until_command() {
        let mut fsm = paused_machine();
        for i in 1..=10 {
            let update = fsm.update(OPEN, 34.0 + i as f64, None);
            assert_eq!(update.state, FocusSessionState::Paused);
        }
        assert_eq!(fsm.focus_count(), 0);
        assert_eq!(fsm.miss_count(), 0);
    }

    #[test]
    fn test_continue_resumes_with_zeroed_counters() {
        let mut fsm = paused_machine();
        let update = fsm.update(CLOSED, 40.0, Some(UserCommand::Continue));
        assert_eq!(update.command, Some(UserCommand::Continue));
        assert_eq!(update.state, FocusSessionState::TrackingUnfocused);
        assert_eq!(fsm.focus_count(), 0);
        assert_eq!(fsm.miss_count(), 0);
        assert_eq!(fsm.unfocused_secs(40.0), None);

        // Fresh pause window starts at the next miss frame
        fsm.update(CLOSED, 41.0, None);
        assert_eq!(
            fsm.update(CLOSED, 70.875, None).state,
            FocusSessionState::TrackingUnfocused
        );
        assert_eq!(
            fsm.update(CLOSED, 71.0, None).state,
            FocusSessionState::Paused
        );
        assert_eq!(fsm.pause_count(), 2);
    }

    #[test]
    fn test_end_is_terminal() {
        let mut fsm = paused_machine();
        let update = fsm.update(OPEN, 40.0, Some(UserCommand::End));
        assert_eq!(update.state, FocusSessionState::Ended);
        assert_eq!(update.command, Some(UserCommand::End));

        for i in 1..=5 {
            let update = fsm.update(OPEN, 40.0 + i as f64, Some(UserCommand::Continue));
            assert_eq!(update.state, FocusSessionState::Ended);
            assert_eq!(update.command, None);
            assert!(!update.changed());
        }
        fsm.recalibrate(50.0);
        assert_eq!(fsm.state(), FocusSessionState::Ended);
    }

    #[test]
    fn test_commands_outside_pause_are_discarded() {
        let mut fsm = calibrated_machine();
        let update = fsm.update(OPEN, 4.0, Some(UserCommand::End));
        assert_eq!(update.command, None);
        assert_eq!(update.state, FocusSessionState::TrackingUnfocused);

        let update = fsm.update(OPEN, 4.125, Some(UserCommand::Continue));
        assert_eq!(update.command, None);
        assert_eq!(fsm.focus_count(), 4);
    }

    #[test]
    fn test_recalibrate_resets_and_keeps_pause() {
        let mut fsm = calibrated_machine();
        for i in 0..5 {
            fsm.update(OPEN, 4.0 + i as f64 * 0.125, None);
        }
        fsm.recalibrate(10.0);
        assert!(!fsm.is_focused());
        assert_eq!(fsm.state(), FocusSessionState::Calibrating);
        assert_eq!(fsm.ear_threshold(), 0.23);

        let mut paused = paused_machine();
        paused.recalibrate(40.0);
        assert_eq!(paused.state(), FocusSessionState::Paused);
        assert!(!paused.calibration().is_calibrated());
    }

    proptest! {
        #[test]
        fn test_focus_confirmed_on_fifth_open_frame(
            start_ms in 4000u32..100_000,
            steps_ms in proptest::collection::vec(1u32..1000, 5),
        ) {
            let mut fsm = calibrated_machine();
            let mut t_ms = start_ms;
            fsm.update(None, t_ms as f64 / 1000.0, None);

            for (i, step) in steps_ms.iter().enumerate() {
                t_ms += step;
                let update = fsm.update(OPEN, t_ms as f64 / 1000.0, None);
                if i < 4 {
                    prop_assert_eq!(update.state, FocusSessionState::TrackingUnfocused);
                } else {
                    prop_assert_eq!(update.state, FocusSessionState::TrackingFocused);
                }
            }
        }

        #[test]
        fn test_pause_fires_on_limit_frame(
            start_ms in 4000u32..100_000,
            step_ms in 10u32..500,
        ) {
            let mut fsm = calibrated_machine();
            fsm.update(CLOSED, start_ms as f64 / 1000.0, None);

            let limit_ms = start_ms + 30_000;
            let mut t_ms = start_ms + step_ms;
            while t_ms < limit_ms {
                let update = fsm.update(CLOSED, t_ms as f64 / 1000.0, None);
                prop_assert_eq!(update.state, FocusSessionState::TrackingUnfocused);
                t_ms += step_ms;
            }
            let update = fsm.update(CLOSED, limit_ms as f64 / 1000.0, None);
            prop_assert_eq!(update.state, FocusSessionState::Paused);
            prop_assert_eq!(fsm.pause_count(), 1);
        }
    }
}
