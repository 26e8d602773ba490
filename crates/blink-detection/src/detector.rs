//! Landmark detector seam
//!
//! Face and landmark detection is done by an external model. The analyzer
//! only needs its output: zero or more landmark sets per frame, with points
//! in the order of the configured `LandmarkScheme`.

use camera_capture::VideoFrame;

use crate::landmarks::LandmarkSet;
use crate::DetectionError;

/// Produces landmark sets for the faces in a frame
pub trait LandmarkDetector {
    /// Detect every face in the frame and return its landmarks
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DetectionError>;
}

impl<F> LandmarkDetector for F
where
    F: FnMut(&VideoFrame) -> Result<Vec<LandmarkSet>, DetectionError>,
{
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, DetectionError> {
        self(frame)
    }
}
