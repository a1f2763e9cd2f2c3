//! Core types for the Synheart Focus pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! per-frame pipeline: landmark frames, signal categories, focus states, and the
//! frame reports handed to rendering and persistence collaborators.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 2D landmark location.
///
/// Landmark providers emit normalized coordinates in `[0, 1]`; extra fields such
/// as `z` or `visibility` are accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale a normalized point into pixel space
    pub fn scaled(&self, size: ImageSize) -> Self {
        Self {
            x: self.x * size.width,
            y: self.y * size.height,
        }
    }

    /// True if the point lies inside the unit image square `[0,1) x [0,1)`
    pub fn in_unit_frame(&self) -> bool {
        (0.0..1.0).contains(&self.x) && (0.0..1.0).contains(&self.y)
    }
}

/// Source image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

/// One video frame's worth of landmark detections.
///
/// `face` is `None` when no face was found. `hands` holds zero, one, or two hand
/// landmark sets (21 points each for a complete set).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub face: Option<Vec<Point>>,
    #[serde(default)]
    pub hands: Vec<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
}

impl LandmarkFrame {
    /// A frame with no detections at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// A frame with a face and no hands
    pub fn with_face(face: Vec<Point>) -> Self {
        Self {
            face: Some(face),
            ..Self::default()
        }
    }

    /// Attach hand landmark sets
    pub fn with_hands(mut self, hands: Vec<Vec<Point>>) -> Self {
        self.hands = hands;
        self
    }

    /// Attach the source image size used to denormalize coordinates
    pub fn with_image_size(mut self, width: f64, height: f64) -> Self {
        self.image_size = Some(ImageSize { width, height });
        self
    }

    pub fn has_face(&self) -> bool {
        self.face.as_ref().is_some_and(|f| !f.is_empty())
    }

    pub fn has_hands(&self) -> bool {
        self.hands.iter().any(|h| !h.is_empty())
    }
}

/// A landmark frame stamped with its monotonic capture time (seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFrame {
    pub timestamp: f64,
    pub frame: LandmarkFrame,
}

impl TimedFrame {
    pub fn new(timestamp: f64, frame: LandmarkFrame) -> Self {
        Self { timestamp, frame }
    }
}

/// Bad-habit categories monitored per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    EyeRubbing,
    NoseRubbing,
    NailBiting,
    HairTouching,
}

impl SignalCategory {
    /// Every category, in a stable order
    pub const ALL: [SignalCategory; 4] = [
        SignalCategory::EyeRubbing,
        SignalCategory::NoseRubbing,
        SignalCategory::NailBiting,
        SignalCategory::HairTouching,
    ];

    /// Position of the category in [`SignalCategory::ALL`]
    pub const fn index(self) -> usize {
        match self {
            SignalCategory::EyeRubbing => 0,
            SignalCategory::NoseRubbing => 1,
            SignalCategory::NailBiting => 2,
            SignalCategory::HairTouching => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::EyeRubbing => "eye_rubbing",
            SignalCategory::NoseRubbing => "nose_rubbing",
            SignalCategory::NailBiting => "nail_biting",
            SignalCategory::HairTouching => "hair_touching",
        }
    }

    /// Human-readable label for warning banners
    pub fn label(&self) -> &'static str {
        match self {
            SignalCategory::EyeRubbing => "Eye Rubbing",
            SignalCategory::NoseRubbing => "Nose Rubbing",
            SignalCategory::NailBiting => "Nail Biting",
            SignalCategory::HairTouching => "Hair Touching",
        }
    }
}

/// Set of currently latched signal categories.
///
/// Serialized as a list of category names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveSignals([bool; 4]);

impl ActiveSignals {
    pub fn set(&mut self, category: SignalCategory, active: bool) {
        self.0[category.index()] = active;
    }

    pub fn contains(&self, category: SignalCategory) -> bool {
        self.0[category.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|a| *a)
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|a| **a).count()
    }

    /// Active categories in [`SignalCategory::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = SignalCategory> + '_ {
        SignalCategory::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.label()).collect()
    }
}

impl FromIterator<SignalCategory> for ActiveSignals {
    fn from_iter<I: IntoIterator<Item = SignalCategory>>(iter: I) -> Self {
        let mut set = ActiveSignals::default();
        for category in iter {
            set.set(category, true);
        }
        set
    }
}

impl Serialize for ActiveSignals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for ActiveSignals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let categories = Vec::<SignalCategory>::deserialize(deserializer)?;
        Ok(categories.into_iter().collect())
    }
}

/// A latch edge reported for one category on one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalTransition {
    pub category: SignalCategory,
    /// `true` when the category just turned on, `false` when it just turned off
    pub active: bool,
}

/// Session-level focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusSessionState {
    Calibrating,
    TrackingFocused,
    TrackingUnfocused,
    Paused,
    Ended,
}

impl FocusSessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusSessionState::Calibrating => "calibrating",
            FocusSessionState::TrackingFocused => "tracking_focused",
            FocusSessionState::TrackingUnfocused => "tracking_unfocused",
            FocusSessionState::Paused => "paused",
            FocusSessionState::Ended => "ended",
        }
    }

    /// Status chip text shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            FocusSessionState::Calibrating => "CALIBRATING",
            FocusSessionState::TrackingFocused => "FOCUSED",
            FocusSessionState::TrackingUnfocused => "NOT FOCUSED",
            FocusSessionState::Paused => "PAUSED",
            FocusSessionState::Ended => "ENDED",
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(
            self,
            FocusSessionState::TrackingFocused | FocusSessionState::TrackingUnfocused
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FocusSessionState::Ended)
    }
}

/// Choice reported back by the pause overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserCommand {
    Continue,
    End,
}

/// Eye-aspect-ratio pair for a frame where both eyes were measurable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeMeasurement {
    pub left_ear: f64,
    pub right_ear: f64,
}

impl EyeMeasurement {
    pub fn mean(&self) -> f64 {
        (self.left_ear + self.right_ear) / 2.0
    }

    /// Both eyes strictly above the open-eye threshold
    pub fn both_open(&self, threshold: f64) -> bool {
        self.left_ear > threshold && self.right_ear > threshold
    }
}

/// Measurement values surfaced for on-screen feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMeasurements {
    pub face_scale: Option<f64>,
    pub left_ear: Option<f64>,
    pub right_ear: Option<f64>,
    /// Open-eye threshold in effect for this frame (fallback until calibrated)
    pub ear_threshold: f64,
    pub calibrated: bool,
    /// Seconds left in the calibration window, while calibrating
    pub calibration_remaining_secs: Option<f64>,
    /// Seconds of continuous unfocus counted toward the pause limit
    pub unfocused_secs: Option<f64>,
}

/// Everything the rendering and aggregation collaborators need for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Monotonic frame timestamp (seconds)
    pub timestamp: f64,
    /// Seconds elapsed since the previous processed frame
    pub dt: f64,
    pub state: FocusSessionState,
    pub focused: bool,
    pub active: ActiveSignals,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<SignalTransition>,
    /// Command honored on this frame, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<UserCommand>,
    pub measurements: FrameMeasurements,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_index_matches_all_order() {
        for (i, category) in SignalCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_active_signals_set_and_iterate() {
        let mut active = ActiveSignals::default();
        assert!(active.is_empty());

        active.set(SignalCategory::HairTouching, true);
        active.set(SignalCategory::EyeRubbing, true);
        assert_eq!(active.len(), 2);
        assert!(active.contains(SignalCategory::EyeRubbing));
        assert!(!active.contains(SignalCategory::NailBiting));

        let order: Vec<_> = active.iter().collect();
        assert_eq!(
            order,
            vec![SignalCategory::EyeRubbing, SignalCategory::HairTouching]
        );
        assert_eq!(active.labels(), vec!["Eye Rubbing", "Hair Touching"]);

        active.set(SignalCategory::EyeRubbing, false);
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_active_signals_serialize_as_names() {
        let active: ActiveSignals = [SignalCategory::NailBiting, SignalCategory::NoseRubbing]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&active).unwrap();
        assert_eq!(json, r#"["nose_rubbing","nail_biting"]"#);

        let parsed: ActiveSignals = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, active);
    }

    #[test]
    fn test_point_accepts_extra_fields() {
        let p: Point = serde_json::from_str(r#"{"x":0.25,"y":0.5,"z":-0.01}"#).unwrap();
        assert_eq!(p, Point::new(0.25, 0.5));
        assert!(p.in_unit_frame());
        assert!(!Point::new(1.0, 0.5).in_unit_frame());
    }

    #[test]
    fn test_point_scaled() {
        let p = Point::new(0.5, 0.25).scaled(ImageSize {
            width: 1280.0,
            height: 720.0,
        });
        assert_eq!(p, Point::new(640.0, 180.0));
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(FocusSessionState::TrackingFocused.label(), "FOCUSED");
        assert_eq!(FocusSessionState::TrackingUnfocused.label(), "NOT FOCUSED");
        assert!(FocusSessionState::Ended.is_terminal());
        assert!(!FocusSessionState::Paused.is_tracking());
    }

    #[test]
    fn test_eye_measurement_strictly_above() {
        let eyes = EyeMeasurement {
            left_ear: 0.3,
            right_ear: 0.2,
        };
        assert!((eyes.mean() - 0.25).abs() < 1e-12);
        assert!(eyes.both_open(0.19));
        assert!(!eyes.both_open(0.2));
    }
}
