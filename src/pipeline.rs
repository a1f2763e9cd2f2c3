//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Focus.
//! It orchestrates the per-frame pipeline from landmarks to frame reports and
//! session records.

use crate::config::EngineConfig;
use crate::error::FocusError;
use crate::features::FeatureExtractor;
use crate::focus::FocusStateMachine;
use crate::mailbox::{Inbox, UiEvents};
use crate::runner::{FrameObserver, SessionOutcome, SessionRunner};
use crate::schema::ReplaySource;
use crate::session::{SessionAggregator, SessionRecord};
use crate::signals::SignalDetectionEngine;
use crate::types::{
    ActiveSignals, FocusSessionState, FrameMeasurements, FrameReport, LandmarkFrame,
};

/// Replay a recorded NDJSON landmark stream and return the session record JSON.
///
/// # Arguments
/// * `ndjson` - focus.landmark_frame.v1 frames, one per line
/// * `config` - Engine configuration
///
/// # Example
/// ```ignore
/// let record_json = replay_to_record(&recording, &EngineConfig::default())?;
/// ```
pub fn replay_to_record(ndjson: &str, config: &EngineConfig) -> Result<String, FocusError> {
    let outcome = replay(ndjson, config, &mut |_: &FrameReport| {})?;
    outcome.record.to_json()
}

/// Replay a recorded NDJSON landmark stream, reporting every processed frame.
///
/// Pipeline stages per frame:
/// 1. FeatureExtractor - Scale-normalized landmark features
/// 2. SignalDetectionEngine - Debounced habit signals
/// 3. FocusStateMachine - Calibration, focus and pause lifecycle
/// 4. SessionAggregator - Time accrual
pub fn replay<O>(
    ndjson: &str,
    config: &EngineConfig,
    observer: &mut O,
) -> Result<SessionOutcome, FocusError>
where
    O: FrameObserver + ?Sized,
{
    let processor = FocusProcessor::new(*config)?;
    let events = UiEvents::new();
    let mut source = ReplaySource::from_ndjson(ndjson, events.clone())?;
    SessionRunner::new(processor, events).run(&mut source, observer)
}

/// Stateful processor for one focus session.
///
/// Feed frames in timestamp order; each call returns the report for that frame.
pub struct FocusProcessor {
    config: EngineConfig,
    signals: SignalDetectionEngine,
    focus: FocusStateMachine,
    aggregator: SessionAggregator,
    last_timestamp: Option<f64>,
    last_report: Option<FrameReport>,
}

impl Default for FocusProcessor {
    fn default() -> Self {
        Self::with_aggregator(EngineConfig::default(), SessionAggregator::new())
    }
}

impl FocusProcessor {
    /// Create a processor for a session starting now
    pub fn new(config: EngineConfig) -> Result<Self, FocusError> {
        config.validate()?;
        Ok(Self::with_aggregator(config, SessionAggregator::new()))
    }

    /// Create a processor with a caller-supplied aggregator (fixed id/start time)
    pub fn with_aggregator(config: EngineConfig, aggregator: SessionAggregator) -> Self {
        Self {
            config,
            signals: SignalDetectionEngine::new(&config),
            focus: FocusStateMachine::new(&config),
            aggregator,
            last_timestamp: None,
            last_report: None,
        }
    }

    /// Load configuration from a TOML document
    pub fn from_toml(text: &str) -> Result<Self, FocusError> {
        Self::new(EngineConfig::from_toml_str(text)?)
    }

    /// Process one frame captured at `now` (seconds, monotonic).
    ///
    /// Frames after the session has ended are not processed; the last ended
    /// report is returned with the new timestamp.
    pub fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        now: f64,
        inbox: Inbox,
    ) -> FrameReport {
        let dt = self
            .last_timestamp
            .map_or(0.0, |last| (now - last).max(0.0));
        self.last_timestamp = Some(now);

        if self.focus.state().is_terminal() {
            return self.ended_report(now, dt);
        }

        if inbox.recalibrate {
            self.focus.recalibrate(now);
        }

        let features = FeatureExtractor::extract(frame);
        let signals = self.signals.update(&features, now);
        let focus = self.focus.update(features.eyes, now, inbox.command);

        let report = FrameReport {
            timestamp: now,
            dt,
            state: focus.state,
            focused: self.focus.is_focused(),
            active: signals.active,
            transitions: signals.transitions,
            command: focus.command,
            measurements: FrameMeasurements {
                face_scale: features.face_scale,
                left_ear: features.eyes.map(|e| e.left_ear),
                right_ear: features.eyes.map(|e| e.right_ear),
                ear_threshold: self.focus.ear_threshold(),
                calibrated: self.focus.calibration().is_calibrated(),
                calibration_remaining_secs: self.focus.calibration().remaining_secs(now),
                unfocused_secs: self.focus.unfocused_secs(now),
            },
        };

        self.aggregator.accrue(&report);
        self.last_report = Some(report.clone());
        report
    }

    fn ended_report(&self, now: f64, dt: f64) -> FrameReport {
        let measurements = match &self.last_report {
            Some(last) => last.measurements.clone(),
            None => FrameMeasurements {
                face_scale: None,
                left_ear: None,
                right_ear: None,
                ear_threshold: self.focus.ear_threshold(),
                calibrated: self.focus.calibration().is_calibrated(),
                calibration_remaining_secs: None,
                unfocused_secs: None,
            },
        };
        FrameReport {
            timestamp: now,
            dt,
            state: FocusSessionState::Ended,
            focused: false,
            active: ActiveSignals::default(),
            transitions: Vec::new(),
            command: None,
            measurements,
        }
    }

    /// Restart eye calibration and focus debouncing at `now`
    pub fn recalibrate(&mut self, now: f64) {
        self.focus.recalibrate(now);
    }

    pub fn state(&self) -> FocusSessionState {
        self.focus.state()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    pub fn focus(&self) -> &FocusStateMachine {
        &self.focus
    }

    pub fn signals(&self) -> &SignalDetectionEngine {
        &self.signals
    }

    /// Most recent report, if any frame has been processed
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Session record for everything processed so far
    pub fn finish(&self) -> SessionRecord {
        self.aggregator.finish()
    }
}
