//! Eye aspect ratio (EAR)
//!
//! Ratio of vertical to horizontal eye opening over a six-point contour.
//! Lower values mean a more closed eye; thresholding happens in the blink
//! state machine.

use serde::{Deserialize, Serialize};

use crate::geometry::distance;
use crate::landmarks::{EyeContour, EyeSide, LandmarkScheme, LandmarkSet};

/// Eye aspect ratio of a six-point contour
///
/// Returns `0.0` when the contour does not have exactly six points, and
/// `f64::INFINITY` when the two corner points coincide.
pub fn eye_aspect_ratio(eye: EyeContour<'_>) -> f64 {
    let &[p0, p1, p2, p3, p4, p5] = eye.points() else {
        return 0.0;
    };

    let vertical_a = distance(p1, p5);
    let vertical_b = distance(p2, p4);
    let horizontal = distance(p0, p3);

    if horizontal == 0.0 {
        return f64::INFINITY;
    }

    (vertical_a + vertical_b) / (2.0 * horizontal)
}

/// Per-eye and mean EAR for one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarPair {
    pub left: f64,
    pub right: f64,
    pub mean: f64,
}

/// EAR of both eyes of a face
pub fn face_ear(face: &LandmarkSet, scheme: &LandmarkScheme) -> EarPair {
    let left = eye_aspect_ratio(face.eye(EyeSide::Left, scheme));
    let right = eye_aspect_ratio(face.eye(EyeSide::Right, scheme));
    EarPair {
        left,
        right,
        mean: (left + right) / 2.0,
    }
}
