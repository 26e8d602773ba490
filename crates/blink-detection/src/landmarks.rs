//! Facial landmark sets and the index schemes that describe them

use std::borrow::Cow;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// Number of points in an eye contour
pub const EYE_CONTOUR_POINTS: usize = 6;

/// Which eye to carve out of a landmark set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeSide {
    Left,
    Right,
}

/// Index layout of a landmark detector's output
///
/// Eye ranges are half-open and must each cover exactly six points ordered
/// corner, upper, upper, corner, lower, lower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkScheme {
    pub name: Cow<'static, str>,
    /// Points per face
    pub point_count: usize,
    pub left_eye: Range<usize>,
    pub right_eye: Range<usize>,
}

impl LandmarkScheme {
    /// iBUG 300-W 68 point layout (dlib `shape_predictor_68_face_landmarks`)
    pub const IBUG_68: LandmarkScheme = LandmarkScheme {
        name: Cow::Borrowed("ibug68"),
        point_count: 68,
        left_eye: 42..48,
        right_eye: 36..42,
    };

    /// Index range of one eye
    pub fn eye_range(&self, side: EyeSide) -> Range<usize> {
        match side {
            EyeSide::Left => self.left_eye.clone(),
            EyeSide::Right => self.right_eye.clone(),
        }
    }

    /// Whether both eye ranges are six points wide and fit inside a face
    pub fn is_well_formed(&self) -> bool {
        [&self.left_eye, &self.right_eye]
            .iter()
            .all(|r| r.len() == EYE_CONTOUR_POINTS && r.end <= self.point_count)
    }
}

impl Default for LandmarkScheme {
    fn default() -> Self {
        Self::IBUG_68
    }
}

/// Ordered landmark points for one detected face in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Point2>,
    /// Identity assigned by an external tracker, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<u64>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points, identity: None }
    }

    /// Attach an externally supplied face identity
    pub fn with_identity(mut self, identity: u64) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn identity(&self) -> Option<u64> {
        self.identity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the set has as many points as the scheme expects
    pub fn is_complete(&self, scheme: &LandmarkScheme) -> bool {
        self.points.len() == scheme.point_count
    }

    /// View of one eye's contour
    ///
    /// A truncated set yields a shorter, possibly empty, contour.
    pub fn eye(&self, side: EyeSide, scheme: &LandmarkScheme) -> EyeContour<'_> {
        let range = scheme.eye_range(side);
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        EyeContour::new(&self.points[start..end])
    }
}

/// Borrowed six-point eye contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeContour<'a> {
    points: &'a [Point2],
}

impl<'a> EyeContour<'a> {
    pub fn new(points: &'a [Point2]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &'a [Point2] {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
