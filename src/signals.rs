//! Bad-habit signal detection
//!
//! Evaluates the four raw proximity conditions for a frame and feeds each into
//! its own [`HysteresisLatch`]. The latches are independent: one category's
//! timers never influence another's.

use crate::config::{EngineConfig, ProximityConfig};
use crate::features::{Finger, FrameFeatures};
use crate::latch::HysteresisLatch;
use crate::types::{ActiveSignals, SignalCategory, SignalTransition};
use tracing::debug;

const NOSE_FINGERS: [Finger; 2] = [Finger::Index, Finger::Middle];
const MOUTH_FINGERS: [Finger; 1] = [Finger::Thumb];

/// Result of one detection step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalUpdate {
    pub active: ActiveSignals,
    /// Categories whose latch changed state on this frame
    pub transitions: Vec<SignalTransition>,
}

/// Raw (undebounced) condition for each category on one frame.
///
/// A frame without face features or without fingertips yields all-false.
pub fn raw_conditions(features: &FrameFeatures, config: &ProximityConfig) -> ActiveSignals {
    let mut raw = ActiveSignals::default();
    let Some(face) = features.face.as_ref() else {
        return raw;
    };
    if features.fingertips.is_empty() {
        return raw;
    }

    let eye_targets = [face.left_eye_center, face.right_eye_center];
    let eye = features
        .tips_of(&Finger::ALL)
        .any(|tip| face.is_near(tip, &eye_targets, config.eye_mul));

    let nose = features
        .tips_of(&NOSE_FINGERS)
        .any(|tip| face.is_near(tip, &face.nose_targets, config.nose_mul));

    let mouth_open =
        !config.require_mouth_open || face.lip_gap() >= config.lip_gap_min_mul * face.scale;
    let nail = mouth_open
        && features
            .tips_of(&MOUTH_FINGERS)
            .any(|tip| face.is_near(tip, &face.mouth_targets, config.mouth_mul));

    let hair = features
        .tips_of(&Finger::ALL)
        .any(|tip| face.in_hair_band(tip, config));

    raw.set(SignalCategory::EyeRubbing, eye);
    raw.set(SignalCategory::NoseRubbing, nose);
    raw.set(SignalCategory::NailBiting, nail);
    raw.set(SignalCategory::HairTouching, hair);
    raw
}

/// Per-category debounced detector
#[derive(Debug, Clone)]
pub struct SignalDetectionEngine {
    latches: [HysteresisLatch; 4],
    proximity: ProximityConfig,
}

impl SignalDetectionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let latch = HysteresisLatch::from_config(&config.latch);
        Self {
            latches: [latch.clone(), latch.clone(), latch.clone(), latch],
            proximity: config.proximity,
        }
    }

    /// Run one frame through the detectors and latches
    pub fn update(&mut self, features: &FrameFeatures, now: f64) -> SignalUpdate {
        let raw = raw_conditions(features, &self.proximity);
        let mut update = SignalUpdate::default();

        for category in SignalCategory::ALL {
            let latch = &mut self.latches[category.index()];
            let changed = latch.update(raw.contains(category), now);
            let active = latch.active();

            if changed {
                debug!(
                    category = category.as_str(),
                    active,
                    timestamp = now,
                    "signal latch transition"
                );
                update.transitions.push(SignalTransition { category, active });
            }
            update.active.set(category, active);
        }

        update
    }

    /// Currently latched categories
    pub fn active(&self) -> ActiveSignals {
        SignalCategory::ALL
            .into_iter()
            .filter(|c| self.latches[c.index()].active())
            .collect()
    }

    pub fn latch(&self, category: SignalCategory) -> &HysteresisLatch {
        &self.latches[category.index()]
    }

    /// Turn every latch off and drop pending timers
    pub fn reset(&mut self) {
        for latch in &mut self.latches {
            latch.reset();
        }
    }
}
