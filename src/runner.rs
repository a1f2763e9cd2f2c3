//! Frame loop
//!
//! Pulls frames from a [`LandmarkSource`], drains the UI mailbox once per
//! iteration, runs the processor, and hands each report to a
//! [`FrameObserver`]. The loop is single-threaded; the only blocking point is
//! the source's `next_frame`.

use crate::error::FocusError;
use crate::mailbox::UiEvents;
use crate::pipeline::FocusProcessor;
use crate::session::SessionRecord;
use crate::types::{FrameReport, TimedFrame};
use tracing::{error, info};

/// Producer of timestamped landmark frames
pub trait LandmarkSource {
    /// Next frame, `Ok(None)` at end of stream. An error is a capture failure
    /// and stops the session.
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, FocusError>;
}

/// Consumer of per-frame reports (rendering, logging, recording)
pub trait FrameObserver {
    fn on_frame(&mut self, report: &FrameReport);
}

impl<F: FnMut(&FrameReport)> FrameObserver for F {
    fn on_frame(&mut self, report: &FrameReport) {
        self(report)
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The user ended the session from the pause overlay
    Ended,
    /// A quit request was drained from the mailbox
    Quit,
    /// The source ran out of frames
    EndOfStream,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Ended => "ended",
            StopReason::Quit => "quit",
            StopReason::EndOfStream => "end_of_stream",
        }
    }
}

/// Result of a completed loop
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub record: SessionRecord,
    pub reason: StopReason,
    pub frames: usize,
}

/// Drives one session from a frame source to a session record
pub struct SessionRunner {
    processor: FocusProcessor,
    events: UiEvents,
}

impl SessionRunner {
    pub fn new(processor: FocusProcessor, events: UiEvents) -> Self {
        Self { processor, events }
    }

    /// Handle for UI callbacks to post commands into this session
    pub fn events(&self) -> UiEvents {
        self.events.clone()
    }

    pub fn processor(&self) -> &FocusProcessor {
        &self.processor
    }

    pub fn into_processor(self) -> FocusProcessor {
        self.processor
    }

    /// Run until the session ends, the user quits, or the source is exhausted.
    ///
    /// A source failure is returned as-is; totals accrued before the failure
    /// remain available through [`SessionRunner::processor`].
    pub fn run<S, O>(
        &mut self,
        source: &mut S,
        observer: &mut O,
    ) -> Result<SessionOutcome, FocusError>
    where
        S: LandmarkSource + ?Sized,
        O: FrameObserver + ?Sized,
    {
        info!(
            session_id = %self.processor.aggregator().session_id(),
            "session loop started"
        );
        let mut frames = 0usize;

        let reason = loop {
            if self.events.is_quit_requested() {
                break StopReason::Quit;
            }

            let timed = match source.next_frame() {
                Ok(Some(timed)) => timed,
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    error!(error = %e, frames, "frame source failed, stopping session");
                    return Err(e);
                }
            };

            let inbox = self.events.take();
            if inbox.quit {
                break StopReason::Quit;
            }

            let report = self
                .processor
                .process_frame(&timed.frame, timed.timestamp, inbox);
            frames += 1;
            observer.on_frame(&report);

            if report.state.is_terminal() {
                break StopReason::Ended;
            }
        };

        let record = self.processor.finish();
        info!(
            reason = reason.as_str(),
            frames,
            total_hours = record.total_hours,
            intervals = record.intervals,
            "session loop stopped"
        );

        Ok(SessionOutcome {
            record,
            reason,
            frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_eyes_frame, open_eyes_frame};
    use crate::types::{FocusSessionState, LandmarkFrame, UserCommand};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    /// Scripted source: frames plus optional commands posted before delivery
    struct ScriptedSource {
        frames: VecDeque<(f64, LandmarkFrame, Option<UserCommand>)>,
        events: UiEvents,
        fail_after: Option<usize>,
        delivered: usize,
    }

    impl ScriptedSource {
        fn new(events: UiEvents) -> Self {
            Self {
                frames: VecDeque::new(),
                events,
                fail_after: None,
                delivered: 0,
            }
        }

        fn push(&mut self, timestamp: f64, frame: LandmarkFrame, command: Option<UserCommand>) {
            self.frames.push_back((timestamp, frame, command));
        }
    }

    impl LandmarkSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<TimedFrame>, FocusError> {
            if self.fail_after == Some(self.delivered) {
                return Err(FocusError::SourceFailed("camera unplugged".to_string()));
            }
            Ok(self.frames.pop_front().map(|(timestamp, frame, command)| {
                if let Some(command) = command {
                    self.events.post(command);
                }
                self.delivered += 1;
                TimedFrame::new(timestamp, frame)
            }))
        }
    }

    fn runner() -> SessionRunner {
        SessionRunner::new(FocusProcessor::default(), UiEvents::new())
    }

    #[test]
    fn test_runs_to_end_of_stream() {
        let mut runner = runner();
        let mut source = ScriptedSource::new(runner.events());
        for i in 0..8 {
            source.push(i as f64 * 0.5, open_eyes_frame(), None);
        }

        let mut states = Vec::new();
        let outcome = runner
            .run(&mut source, &mut |r: &FrameReport| states.push(r.state))
            .unwrap();

        assert_eq!(outcome.reason, StopReason::EndOfStream);
        assert_eq!(outcome.frames, 8);
        assert_eq!(states.len(), 8);
        assert_eq!(states[0], FocusSessionState::Calibrating);
        assert_eq!(states[7], FocusSessionState::TrackingFocused);
        assert_eq!(outcome.record.intervals, 0);
    }

    #[test]
    fn test_pause_then_end_stops_loop() {
        let mut runner = runner();
        let mut source = ScriptedSource::new(runner.events());
        source.push(0.0, closed_eyes_frame(), None);
        source.push(10.0, closed_eyes_frame(), None);
        source.push(30.0, closed_eyes_frame(), None);
        // End chosen from the pause overlay
        source.push(31.0, closed_eyes_frame(), Some(UserCommand::End));
        source.push(32.0, open_eyes_frame(), None);

        let outcome = runner.run(&mut source, &mut |_: &FrameReport| {}).unwrap();
        assert_eq!(outcome.reason, StopReason::Ended);
        assert_eq!(outcome.frames, 4);
        assert_eq!(outcome.record.intervals, 1);
        assert_eq!(outcome.record.time_paused, 1.0);
        assert_eq!(outcome.record.time_unfocused, 30.0);
    }

    #[test]
    fn test_quit_is_immediate() {
        let mut runner = runner();
        let events = runner.events();
        let mut source = ScriptedSource::new(events.clone());
        for i in 0..5 {
            source.push(i as f64, open_eyes_frame(), None);
        }

        let mut seen = 0;
        let outcome = runner
            .run(&mut source, &mut |_: &FrameReport| {
                seen += 1;
                if seen == 2 {
                    events.request_quit();
                }
            })
            .unwrap();

        assert_eq!(outcome.reason, StopReason::Quit);
        assert_eq!(outcome.frames, 2);
    }

    #[test]
    fn test_source_failure_is_returned() {
        let mut runner = runner();
        let mut source = ScriptedSource::new(runner.events());
        source.push(0.0, closed_eyes_frame(), None);
        source.push(2.0, closed_eyes_frame(), None);
        source.push(4.0, closed_eyes_frame(), None);
        source.fail_after = Some(2);

        let err = runner.run(&mut source, &mut |_: &FrameReport| {}).unwrap_err();
        assert!(matches!(err, FocusError::SourceFailed(_)));

        // Totals up to the failure are intact
        assert_eq!(runner.processor().finish().time_unfocused, 2.0);
    }
}
