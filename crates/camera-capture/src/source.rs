//! Frame sources

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{frame::load_frame, CameraError, VideoFrame};

/// Extensions accepted by `ImageSequenceSource`
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A blocking source of video frames
///
/// `read_frame` blocks until the next frame is available. `Ok(None)` means the
/// source is exhausted; an error means capture failed. Either ends a session.
pub trait FrameSource {
    /// Read the next frame
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Release any held device or file resources
    fn release(&mut self) {}
}

/// Frames replayed from a directory of image files, in file name order
pub struct ImageSequenceSource {
    files: VecDeque<PathBuf>,
    interval_ns: u64,
    sequence: u32,
}

impl ImageSequenceSource {
    /// Open a directory of frames captured at `fps`
    pub fn open(dir: impl AsRef<Path>, fps: u32) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            warn!("No image frames found in {}", dir.display());
        }
        info!("Opened image sequence {} ({} frames)", dir.display(), files.len());

        Ok(Self {
            files: files.into(),
            interval_ns: if fps == 0 { 0 } else { 1_000_000_000 / fps as u64 },
            sequence: 0,
        })
    }

    /// Frames not yet read
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };

        let mut frame = load_frame(&path)?;
        frame.sequence = self.sequence;
        frame.timestamp_ns = self.sequence as u64 * self.interval_ns;
        self.sequence += 1;

        debug!("Read frame {} from {}", frame.sequence, path.display());
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.files.clear();
    }
}

/// In-memory frame source
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<VideoFrame>,
    released: bool,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = VideoFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            released: false,
        }
    }

    /// Whether `release` has been called
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSource for MemorySource {
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.released {
            return Err(CameraError::Capture("source already released".to_string()));
        }
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.frames.clear();
        self.released = true;
    }
}
