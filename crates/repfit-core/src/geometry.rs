//! Planar joint geometry over pose keypoints.

use nalgebra::Vector2;

use crate::types::Keypoint;

/// Segments shorter than this are treated as collapsed (no defined direction)
const MIN_SEGMENT_LENGTH: f64 = 1e-10;

/// Angle between two vectors in radians, `None` when either is degenerate
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> Option<f64> {
    let norms = v1.norm() * v2.norm();
    if norms < MIN_SEGMENT_LENGTH {
        return None;
    }
    // Rounding can push the cosine just past +/-1, which acos turns into NaN.
    Some((v1.dot(v2) / norms).clamp(-1.0, 1.0).acos())
}

/// Interior angle at `b` formed by `a-b-c`, in degrees within [0, 180]
pub fn joint_angle(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> Option<f64> {
    let ab = a.to_point2() - b.to_point2();
    let cb = c.to_point2() - b.to_point2();
    angle_between(&ab, &cb).map(f64::to_degrees)
}

/// Mean of the left and right joint angles; `None` if either side is undefined
pub fn bilateral_angle(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    Some((left? + right?) / 2.0)
}
