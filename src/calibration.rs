//! Eye-openness calibration
//!
//! During a warm-up window at session start the module collects the mean EAR of
//! every frame with two measurable, non-zero eyes. Once the window has elapsed
//! it derives a personal open-eye threshold from the median sample:
//!
//! ```text
//! threshold = max(ear_min_clamp, median(samples) * ear_margin)
//! ```
//!
//! falling back to `ear_fallback` as the median when nothing was collected.
//! Until derivation happens `threshold()` reports the fallback itself.

use crate::config::CalibrationConfig;
use crate::types::EyeMeasurement;
use std::collections::VecDeque;
use tracing::info;

/// Median of a sample set; `None` when empty
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Open-eye threshold derived from calibration samples
pub fn derive_threshold(samples: &[f64], config: &CalibrationConfig) -> f64 {
    let base = median(samples).unwrap_or(config.ear_fallback);
    (base * config.ear_margin).max(config.ear_min_clamp)
}

/// Per-session EAR calibration
#[derive(Debug, Clone)]
pub struct CalibrationModule {
    config: CalibrationConfig,
    started_at: Option<f64>,
    samples: VecDeque<f64>,
    threshold: Option<f64>,
}

impl CalibrationModule {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            started_at: None,
            samples: VecDeque::with_capacity(config.max_samples),
            threshold: None,
        }
    }

    /// Feed one frame. Returns the threshold on the frame it gets derived.
    ///
    /// The window starts at the first observed frame unless [`reset`] pinned it.
    ///
    /// [`reset`]: CalibrationModule::reset
    pub fn observe(&mut self, now: f64, eyes: Option<EyeMeasurement>) -> Option<f64> {
        let start = *self.started_at.get_or_insert(now);
        let elapsed = now - start;

        if elapsed <= self.config.window_secs {
            if let Some(eyes) = eyes {
                if eyes.left_ear > 0.0 && eyes.right_ear > 0.0 {
                    if self.samples.len() == self.config.max_samples {
                        self.samples.pop_front();
                    }
                    self.samples.push_back(eyes.mean());
                }
            }
            return None;
        }

        if self.threshold.is_some() {
            return None;
        }

        let samples: Vec<f64> = self.samples.iter().copied().collect();
        let threshold = derive_threshold(&samples, &self.config);
        self.threshold = Some(threshold);
        info!(
            threshold,
            samples = samples.len(),
            "eye calibration complete"
        );
        Some(threshold)
    }

    /// Threshold in effect: the derived value, or the fallback while calibrating
    pub fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(self.config.ear_fallback)
    }

    pub fn is_calibrated(&self) -> bool {
        self.threshold.is_some()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Seconds left in the window; `None` once calibrated
    pub fn remaining_secs(&self, now: f64) -> Option<f64> {
        if self.is_calibrated() {
            return None;
        }
        let elapsed = self.started_at.map_or(0.0, |start| now - start);
        Some((self.config.window_secs - elapsed).max(0.0))
    }

    /// Discard samples and threshold, restarting the window at `now`
    pub fn reset(&mut self, now: f64) {
        self.started_at = Some(now);
        self.samples.clear();
        self.threshold = None;
    }
}
