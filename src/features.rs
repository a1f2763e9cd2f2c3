//! Landmark feature extraction
//!
//! Converts a frame's raw face and hand landmarks into the points and ratios the
//! detectors consume: eye-aspect ratios, eye/nose/mouth target zones, hair-band
//! references, and fingertips. All distance thresholds are expressed as
//! multiples of the face scale so detection does not depend on resolution or
//! distance to the camera.
//!
//! Extraction never fails. A missing face, or a degraded landmark set lacking
//! a required index, simply yields no features for that part of the frame.

use crate::config::ProximityConfig;
use crate::geometry::{distance, face_scale, midpoint, min_distance};
use crate::types::{EyeMeasurement, ImageSize, LandmarkFrame, Point};

/// Six EAR landmarks per eye: outer/inner corners and two vertical pairs
pub const LEFT_EYE: [usize; 6] = [33, 159, 158, 133, 153, 144];
pub const RIGHT_EYE: [usize; 6] = [362, 386, 385, 263, 374, 373];

pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;
/// Iris centers (present only in refined face meshes)
pub const LEFT_EYE_CENTER: usize = 468;
pub const RIGHT_EYE_CENTER: usize = 473;
pub const UPPER_LIP: usize = 13;
pub const LOWER_LIP: usize = 14;
pub const MOUTH_CORNERS: [usize; 2] = [61, 291];
pub const NOSE_TIP: usize = 1;
pub const NOSE_BRIDGE: [usize; 4] = [6, 197, 195, 5];
pub const FOREHEAD_CENTER: usize = 10;
pub const LEFT_TEMPLE: usize = 127;
pub const RIGHT_TEMPLE: usize = 356;

/// At most this many hands are considered per frame
pub const MAX_HANDS: usize = 2;

/// Horizontal eye distances at or below this produce an EAR of zero
const EAR_MIN_HORIZONTAL: f64 = 1e-6;

/// Fingers whose tips are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Tip index within a 21-point hand landmark set
    pub const fn tip_index(self) -> usize {
        match self {
            Finger::Thumb => 4,
            Finger::Index => 8,
            Finger::Middle => 12,
            Finger::Ring => 16,
            Finger::Pinky => 20,
        }
    }
}

/// A fingertip location on one of the detected hands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fingertip {
    pub finger: Finger,
    pub hand: usize,
    pub point: Point,
}

/// Face target zones for the habit detectors
#[derive(Debug, Clone, PartialEq)]
pub struct FaceFeatures {
    pub scale: f64,
    pub left_eye_center: Point,
    pub right_eye_center: Point,
    /// Nose tip followed by the four bridge points
    pub nose_targets: [Point; 5],
    /// Upper lip, lower lip, both corners, and the lip midpoint
    pub mouth_targets: [Point; 5],
    pub upper_lip: Point,
    pub lower_lip: Point,
    pub forehead: Point,
    pub left_temple: Point,
    pub right_temple: Point,
}

impl FaceFeatures {
    /// Distance threshold for a proximity multiplier
    pub fn threshold(&self, multiplier: f64) -> f64 {
        multiplier * self.scale
    }

    /// The higher (smaller y) of the two eye centers
    pub fn eye_line_y(&self) -> f64 {
        self.left_eye_center.y.min(self.right_eye_center.y)
    }

    pub fn lip_gap(&self) -> f64 {
        (self.lower_lip.y - self.upper_lip.y).abs()
    }

    /// Whether `point` lies within `multiplier * scale` of any target
    pub fn is_near(&self, point: Point, targets: &[Point], multiplier: f64) -> bool {
        min_distance(point, targets) <= self.threshold(multiplier)
    }

    /// Hair band membership: above the forehead band or near a temple, and in
    /// either case above the eye line.
    pub fn in_hair_band(&self, point: Point, config: &ProximityConfig) -> bool {
        let above_forehead =
            point.y < self.forehead.y - config.hair_above_forehead_mul * self.scale;
        let near_temples = self.is_near(
            point,
            &[self.left_temple, self.right_temple],
            config.hair_mul,
        );
        let above_eye = point.y < self.eye_line_y() - config.hair_above_eye_mul * self.scale;
        (above_forehead || near_temples) && above_eye
    }
}

/// Everything extracted from a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameFeatures {
    pub face_scale: Option<f64>,
    pub face: Option<FaceFeatures>,
    pub eyes: Option<EyeMeasurement>,
    pub fingertips: Vec<Fingertip>,
}

impl FrameFeatures {
    /// Tip positions for the given fingers across all hands
    pub fn tips_of<'a>(&'a self, fingers: &'a [Finger]) -> impl Iterator<Item = Point> + 'a {
        self.fingertips
            .iter()
            .filter(move |t| fingers.contains(&t.finger))
            .map(|t| t.point)
    }
}

/// Feature extractor for landmark frames
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract all features from a frame
    pub fn extract(frame: &LandmarkFrame) -> FrameFeatures {
        let face_scale = Self::face_scale(frame);
        let face = face_scale.and_then(|scale| Self::face_features(frame, scale));

        FrameFeatures {
            face_scale,
            face,
            eyes: Self::eye_measurement(frame),
            fingertips: Self::fingertips(frame),
        }
    }

    /// Interocular scale reference, if a face with both outer eye corners is present
    pub fn face_scale(frame: &LandmarkFrame) -> Option<f64> {
        let face = frame.face.as_deref()?;
        let size = frame.image_size;
        let left = landmark(face, LEFT_EYE_OUTER, size)?;
        let right = landmark(face, RIGHT_EYE_OUTER, size)?;
        Some(face_scale(left, right))
    }

    /// Target zones for habit detection; `None` if any required index is missing
    pub fn face_features(frame: &LandmarkFrame, scale: f64) -> Option<FaceFeatures> {
        let face = frame.face.as_deref()?;
        let size = frame.image_size;
        let at = |idx: usize| landmark(face, idx, size);

        let upper_lip = at(UPPER_LIP)?;
        let lower_lip = at(LOWER_LIP)?;

        Some(FaceFeatures {
            scale,
            left_eye_center: at(LEFT_EYE_CENTER)?,
            right_eye_center: at(RIGHT_EYE_CENTER)?,
            nose_targets: [
                at(NOSE_TIP)?,
                at(NOSE_BRIDGE[0])?,
                at(NOSE_BRIDGE[1])?,
                at(NOSE_BRIDGE[2])?,
                at(NOSE_BRIDGE[3])?,
            ],
            mouth_targets: [
                upper_lip,
                lower_lip,
                at(MOUTH_CORNERS[0])?,
                at(MOUTH_CORNERS[1])?,
                midpoint(upper_lip, lower_lip),
            ],
            upper_lip,
            lower_lip,
            forehead: at(FOREHEAD_CENTER)?,
            left_temple: at(LEFT_TEMPLE)?,
            right_temple: at(RIGHT_TEMPLE)?,
        })
    }

    /// EAR for both eyes when all twelve eye landmarks are present and in frame
    pub fn eye_measurement(frame: &LandmarkFrame) -> Option<EyeMeasurement> {
        let face = frame.face.as_deref()?;

        let in_frame = LEFT_EYE
            .iter()
            .chain(RIGHT_EYE.iter())
            .all(|&idx| face.get(idx).is_some_and(|p| p.in_unit_frame()));
        if !in_frame {
            return None;
        }

        let left = eye_points(face, &LEFT_EYE, frame.image_size)?;
        let right = eye_points(face, &RIGHT_EYE, frame.image_size)?;

        Some(EyeMeasurement {
            left_ear: eye_aspect_ratio(&left),
            right_ear: eye_aspect_ratio(&right),
        })
    }

    /// Fingertips from up to [`MAX_HANDS`] hands; missing tip indices are skipped
    pub fn fingertips(frame: &LandmarkFrame) -> Vec<Fingertip> {
        let mut tips = Vec::with_capacity(MAX_HANDS * Finger::ALL.len());
        for (hand_idx, hand) in frame.hands.iter().take(MAX_HANDS).enumerate() {
            for finger in Finger::ALL {
                if let Some(point) = landmark(hand, finger.tip_index(), frame.image_size) {
                    tips.push(Fingertip {
                        finger,
                        hand: hand_idx,
                        point,
                    });
                }
            }
        }
        tips
    }
}

/// Eye-aspect ratio: `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`
pub fn eye_aspect_ratio(points: &[Point; 6]) -> f64 {
    let v1 = distance(points[1], points[5]);
    let v2 = distance(points[2], points[4]);
    let h = distance(points[0], points[3]);
    if h > EAR_MIN_HORIZONTAL {
        (v1 + v2) / (2.0 * h)
    } else {
        0.0
    }
}

fn landmark(points: &[Point], idx: usize, size: Option<ImageSize>) -> Option<Point> {
    let p = points.get(idx)?;
    if !(p.x.is_finite() && p.y.is_finite()) {
        return None;
    }
    Some(match size {
        Some(size) => p.scaled(size),
        None => *p,
    })
}

fn eye_points(face: &[Point], indices: &[usize; 6], size: Option<ImageSize>) -> Option<[Point; 6]> {
    let mut out = [Point::default(); 6];
    for (slot, &idx) in out.iter_mut().zip(indices.iter()) {
        *slot = landmark(face, idx, size)?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hand_with_tip, synthetic_face, FACE_SCALE, LEFT_EYE_CENTER_PT};

    #[test]
    fn test_ear_formula() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, -0.5),
            Point::new(3.0, -0.5),
            Point::new(4.0, 0.0),
            Point::new(3.0, 0.5),
            Point::new(1.0, 0.5),
        ];
        // (1 + 1) / (2 * 4)
        assert!((eye_aspect_ratio(&pts) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_ear_degenerate_horizontal() {
        let p = Point::new(0.5, 0.5);
        assert_eq!(eye_aspect_ratio(&[p; 6]), 0.0);
    }

    #[test]
    fn test_extract_full_face() {
        let frame = LandmarkFrame::with_face(synthetic_face(0.3));
        let features = FeatureExtractor::extract(&frame);

        assert_eq!(features.face_scale, Some(FACE_SCALE));
        let face = features.face.expect("face features");
        assert_eq!(face.left_eye_center, LEFT_EYE_CENTER_PT);
        assert_eq!(face.eye_line_y(), 0.375);

        let eyes = features.eyes.expect("eyes measurable");
        assert!((eyes.left_ear - 0.3).abs() < 1e-9);
        assert!((eyes.right_ear - 0.3).abs() < 1e-9);
        assert!(features.fingertips.is_empty());
    }

    #[test]
    fn test_no_face_yields_no_features() {
        let frame = LandmarkFrame::empty().with_hands(vec![hand_with_tip(
            Finger::Index,
            Point::new(0.5, 0.5),
        )]);
        let features = FeatureExtractor::extract(&frame);
        assert!(features.face_scale.is_none());
        assert!(features.face.is_none());
        assert!(features.eyes.is_none());
        assert_eq!(features.fingertips.len(), 5);
    }

    #[test]
    fn test_degraded_face_without_iris() {
        let mut face = synthetic_face(0.3);
        face.truncate(468);
        let features = FeatureExtractor::extract(&LandmarkFrame::with_face(face));

        // Scale and EAR survive, habit targets do not
        assert!(features.face_scale.is_some());
        assert!(features.face.is_none());
        assert!(features.eyes.is_some());
    }

    #[test]
    fn test_eyes_out_of_frame_not_measurable() {
        let mut face = synthetic_face(0.3);
        face[LEFT_EYE[1]] = Point::new(0.42, -0.01);
        let features = FeatureExtractor::extract(&LandmarkFrame::with_face(face));
        assert!(features.eyes.is_none());
        assert!(features.face.is_some());
    }

    #[test]
    fn test_image_size_scales_distances() {
        let frame = LandmarkFrame::with_face(synthetic_face(0.3)).with_image_size(1280.0, 720.0);
        let features = FeatureExtractor::extract(&frame);
        assert_eq!(features.face_scale, Some(FACE_SCALE * 1280.0));
    }

    #[test]
    fn test_fingertips_limited_to_two_hands() {
        let hand = hand_with_tip(Finger::Thumb, Point::new(0.1, 0.1));
        let frame = LandmarkFrame::empty().with_hands(vec![hand.clone(), hand.clone(), hand]);
        let tips = FeatureExtractor::fingertips(&frame);
        assert_eq!(tips.len(), 10);
        assert!(tips.iter().all(|t| t.hand < 2));
    }

    #[test]
    fn test_degraded_hand_skips_missing_tips() {
        let mut hand = hand_with_tip(Finger::Index, Point::new(0.2, 0.2));
        hand.truncate(13);
        let frame = LandmarkFrame::empty().with_hands(vec![hand]);
        let tips = FeatureExtractor::fingertips(&frame);
        let fingers: Vec<_> = tips.iter().map(|t| t.finger).collect();
        assert_eq!(fingers, vec![Finger::Thumb, Finger::Index, Finger::Middle]);
    }

    #[test]
    fn test_hair_band() {
        let frame = LandmarkFrame::with_face(synthetic_face(0.3));
        let face = FeatureExtractor::extract(&frame).face.unwrap();
        let config = ProximityConfig::default();

        // Above the forehead band
        assert!(face.in_hair_band(Point::new(0.5, 0.125), &config));
        // Near the left temple and above the eye line
        assert!(face.in_hair_band(Point::new(0.3125, 0.3125), &config));
        // Near the temple but below the eye line
        assert!(!face.in_hair_band(Point::new(0.3125, 0.39), &config));
        // Forehead height but not above the buffer and far from temples
        assert!(!face.in_hair_band(Point::new(0.5, 0.18), &config));
    }
}
