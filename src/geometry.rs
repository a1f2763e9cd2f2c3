//! Planar geometry helpers shared by feature extraction and detection.

use crate::types::Point;

/// Smallest face scale accepted, guarding divisions by the interocular distance
pub const MIN_FACE_SCALE: f64 = 1e-6;

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Minimum distance from `point` to any target; infinity for an empty set
pub fn min_distance(point: Point, targets: &[Point]) -> f64 {
    targets
        .iter()
        .map(|t| distance(point, *t))
        .fold(f64::INFINITY, f64::min)
}

/// Face scale reference: distance between the two outer eye corners, floored
/// so it stays strictly positive.
pub fn face_scale(left_outer: Point, right_outer: Point) -> f64 {
    distance(left_outer, right_outer).max(MIN_FACE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_min_distance() {
        let targets = [Point::new(10.0, 0.0), Point::new(0.0, 2.0)];
        assert_eq!(min_distance(Point::new(0.0, 0.0), &targets), 2.0);
        assert!(min_distance(Point::new(0.0, 0.0), &[]).is_infinite());
    }

    #[test]
    fn test_face_scale_floor() {
        let p = Point::new(0.4, 0.4);
        assert_eq!(face_scale(p, p), MIN_FACE_SCALE);
        assert_eq!(face_scale(Point::new(0.0, 0.0), Point::new(0.2, 0.0)), 0.2);
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(
            midpoint(Point::new(0.0, 1.0), Point::new(2.0, 3.0)),
            Point::new(1.0, 2.0)
        );
    }
}
