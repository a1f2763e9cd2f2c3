//! Synthetic landmark fixtures shared by unit tests.
//!
//! Coordinates are chosen as dyadic fractions so scale-relative thresholds
//! compare exactly. The face scale (outer eye corner distance) is 0.25.

use crate::features::{
    Finger, FOREHEAD_CENTER, LEFT_EYE, LEFT_EYE_CENTER, LEFT_TEMPLE, LOWER_LIP, MOUTH_CORNERS,
    NOSE_BRIDGE, NOSE_TIP, RIGHT_EYE, RIGHT_EYE_CENTER, RIGHT_TEMPLE, UPPER_LIP,
};
use crate::types::{LandmarkFrame, Point};

pub const FACE_POINTS: usize = 478;
pub const HAND_POINTS: usize = 21;
pub const FACE_SCALE: f64 = 0.25;

pub const LEFT_EYE_CENTER_PT: Point = Point::new(0.40625, 0.375);
pub const RIGHT_EYE_CENTER_PT: Point = Point::new(0.59375, 0.375);
pub const NOSE_TIP_PT: Point = Point::new(0.5, 0.5);
pub const MOUTH_MID_PT: Point = Point::new(0.5, 0.5703125);
pub const FAR_PT: Point = Point::new(0.875, 0.875);

const EYE_LINE: f64 = 0.375;
const EYE_WIDTH: f64 = 0.0625;

/// A complete face mesh whose eyes both have the given aspect ratio
pub fn synthetic_face(ear: f64) -> Vec<Point> {
    let mut face = vec![Point::new(0.5, 0.8); FACE_POINTS];

    place_eye(&mut face, &LEFT_EYE, 0.375, ear);
    place_eye(&mut face, &RIGHT_EYE, 0.5625, ear);

    face[LEFT_EYE_CENTER] = LEFT_EYE_CENTER_PT;
    face[RIGHT_EYE_CENTER] = RIGHT_EYE_CENTER_PT;

    face[NOSE_TIP] = NOSE_TIP_PT;
    face[NOSE_BRIDGE[0]] = Point::new(0.5, 0.40625);
    face[NOSE_BRIDGE[1]] = Point::new(0.5, 0.4375);
    face[NOSE_BRIDGE[2]] = Point::new(0.5, 0.453125);
    face[NOSE_BRIDGE[3]] = Point::new(0.5, 0.46875);

    face[UPPER_LIP] = Point::new(0.5, 0.5625);
    face[LOWER_LIP] = Point::new(0.5, 0.578125);
    face[MOUTH_CORNERS[0]] = Point::new(0.4375, 0.5703125);
    face[MOUTH_CORNERS[1]] = Point::new(0.5625, 0.5703125);

    face[FOREHEAD_CENTER] = Point::new(0.5, 0.1875);
    face[LEFT_TEMPLE] = Point::new(0.3125, 0.34375);
    face[RIGHT_TEMPLE] = Point::new(0.6875, 0.34375);

    face
}

/// Eye corners span `EYE_WIDTH` starting at `left_x`; verticals sized for `ear`
fn place_eye(face: &mut [Point], indices: &[usize; 6], left_x: f64, ear: f64) {
    let half = ear * EYE_WIDTH / 2.0;
    let x0 = left_x;
    let x3 = left_x + EYE_WIDTH;
    let x1 = left_x + EYE_WIDTH / 4.0;
    let x2 = left_x + EYE_WIDTH * 0.75;

    face[indices[0]] = Point::new(x0, EYE_LINE);
    face[indices[1]] = Point::new(x1, EYE_LINE - half);
    face[indices[2]] = Point::new(x2, EYE_LINE - half);
    face[indices[3]] = Point::new(x3, EYE_LINE);
    face[indices[4]] = Point::new(x2, EYE_LINE + half);
    face[indices[5]] = Point::new(x1, EYE_LINE + half);
}

/// A hand with every landmark parked far from the face, except one fingertip
pub fn hand_with_tip(finger: Finger, tip: Point) -> Vec<Point> {
    let mut hand = vec![FAR_PT; HAND_POINTS];
    hand[finger.tip_index()] = tip;
    hand
}

/// Face with open eyes
pub fn open_eyes_frame() -> LandmarkFrame {
    LandmarkFrame::with_face(synthetic_face(0.3))
}

/// Face with closed eyes
pub fn closed_eyes_frame() -> LandmarkFrame {
    LandmarkFrame::with_face(synthetic_face(0.1))
}

/// Open-eyed face with one fingertip placed at `tip`
pub fn touch_frame(finger: Finger, tip: Point) -> LandmarkFrame {
    open_eyes_frame().with_hands(vec![hand_with_tip(finger, tip)])
}
