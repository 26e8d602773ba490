//! Per-frame analysis results

use serde::{Deserialize, Serialize};

use crate::ear::EarPair;
use crate::geometry::{BoundingBox, Point2};

/// Key a face's blink state is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceKey {
    /// Identity supplied by an external tracker
    Identity(u64),
    /// Position of the face in the frame's detection list
    Slot(usize),
    /// Single state shared by all faces
    Shared,
}

/// Analysis of one face in one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAnalysis {
    /// State key this face was matched to
    pub key: FaceKey,

    /// Eye aspect ratios
    pub ear: EarPair,

    /// Whether this face emitted a blink this frame
    pub blink: bool,

    /// Eye considered closed after this frame
    pub eye_closed: bool,

    /// Frames left in the blink cooldown after this frame
    pub cooldown_remaining: u32,

    /// Whether the landmark set had the scheme's full point count
    pub complete: bool,

    /// Face region (bounding box of all landmarks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_bbox: Option<BoundingBox>,

    /// Left eye contour, for annotation
    pub left_eye: Vec<Point2>,

    /// Right eye contour, for annotation
    pub right_eye: Vec<Point2>,
}

/// Complete analysis of one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// One entry per detected face, in detection order
    pub faces: Vec<FaceAnalysis>,

    /// Blink events emitted this frame
    pub blinks: u32,
}

impl FrameAnalysis {
    /// Whether any face was detected
    pub fn face_detected(&self) -> bool {
        !self.faces.is_empty()
    }
}
