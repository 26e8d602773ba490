//! Blink Detection
//!
//! Real-time blink detection from facial landmarks:
//! - Eye aspect ratio (EAR) from six-point eye contours
//! - Edge-triggered blink state machine with frame cooldown
//! - Per-frame analysis over every detected face
//! - Frame annotation for display or export

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod detector;
pub mod ear;
pub mod geometry;
pub mod landmarks;
pub mod overlay;
pub mod state;

pub use analysis::{FaceAnalysis, FaceKey, FrameAnalysis};
pub use analyzer::FrameAnalyzer;
pub use config::{BlinkConfig, FaceTracking};
pub use detector::LandmarkDetector;
pub use ear::{eye_aspect_ratio, face_ear, EarPair};
pub use geometry::{distance, BoundingBox, Point2};
pub use landmarks::{EyeContour, EyeSide, LandmarkScheme, LandmarkSet};
pub use state::BlinkState;

use camera_capture::CameraError;
use thiserror::Error;

/// Blink detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Landmark detection failed: {0}")]
    Detector(String),

    #[error("Frame error: {0}")]
    Frame(#[from] CameraError),
}
