//! Video frame types and image file helpers

use std::path::Path;

use image::RgbImage;
use tracing::debug;

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a black frame of the given size
    pub fn blank(width: u32, height: u32, sequence: u32) -> Self {
        Self::new(vec![0; (width * height * 3) as usize], width, height, 0, sequence)
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(img: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Copy the pixel data into an `RgbImage`
    pub fn to_rgb_image(&self) -> Result<RgbImage, CameraError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CameraError::Format(format!(
                "{} bytes do not fill a {}x{} RGB frame",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }
}

/// Write a frame to disk; the format follows the file extension
pub fn save_frame(path: impl AsRef<Path>, frame: &VideoFrame) -> Result<(), CameraError> {
    let path = path.as_ref();
    frame.to_rgb_image()?.save(path)?;
    debug!("Frame {} saved to {}", frame.sequence, path.display());
    Ok(())
}

/// Read a previously saved frame back from disk
pub fn load_frame(path: impl AsRef<Path>) -> Result<VideoFrame, CameraError> {
    let img = image::open(path.as_ref())?.to_rgb8();
    Ok(VideoFrame::from_rgb_image(img, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_pixel_bounds() {
        let mut frame = VideoFrame::blank(4, 2, 0);
        frame.data[3..6].copy_from_slice(&[10, 20, 30]);

        assert_eq!(frame.get_pixel(1, 0), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(4, 0), None);
        assert_eq!(frame.get_pixel(0, 2), None);
    }

    #[test]
    fn test_short_buffer_is_format_error() {
        let frame = VideoFrame::new(vec![0; 5], 2, 1, 0, 0);
        assert!(matches!(frame.to_rgb_image(), Err(CameraError::Format(_))));
    }

    #[test]
    fn test_save_and_load_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        let mut frame = VideoFrame::blank(3, 3, 7);
        frame.data[0..3].copy_from_slice(&[0, 255, 0]);
        save_frame(&path, &frame).unwrap();

        let loaded = load_frame(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (3, 3));
        assert_eq!(loaded.get_pixel(0, 0), Some([0, 255, 0]));
    }
}
