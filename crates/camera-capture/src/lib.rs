//! Camera Capture Library for the Blink Monitor
//!
//! Provides the frame acquisition side of the pipeline:
//! - `VideoFrame`, a decoded RGB frame with capture metadata
//! - the `FrameSource` trait implemented by every capture backend
//! - file-backed and in-memory sources for headless runs and tests

pub mod frame;
pub mod source;

pub use frame::{load_frame, save_frame, VideoFrame};
pub use source::{FrameSource, ImageSequenceSource, MemorySource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera configuration
///
/// Frame dimensions are informational for the detection core; they are
/// handed to whatever backend opens the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device path or index (e.g., "/dev/video0" or "0")
    pub device: String,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "0".to_string(),
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

impl CameraConfig {
    /// Interval between frames at the configured rate, in nanoseconds
    pub fn frame_interval_ns(&self) -> u64 {
        if self.fps == 0 {
            return 0;
        }
        1_000_000_000 / self.fps as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CameraConfig::default();
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn test_frame_interval() {
        let config = CameraConfig::default();
        assert_eq!(config.frame_interval_ns(), 33_333_333);

        let stalled = CameraConfig { fps: 0, ..Default::default() };
        assert_eq!(stalled.frame_interval_ns(), 0);
    }
}
