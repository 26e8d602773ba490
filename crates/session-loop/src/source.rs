//! Landmark sources
//!
//! A session consumes one `Vec<LandmarkSet>` per frame. Sources either replay
//! recorded landmarks or run a `LandmarkDetector` over a `FrameSource`.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use blink_detection::{DetectionError, LandmarkDetector, LandmarkSet};
use camera_capture::{CameraError, FrameSource, VideoFrame};
use thiserror::Error;
use tracing::{debug, info};

/// Landmark source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Capture failed: {0}")]
    Camera(#[from] CameraError),

    #[error("Landmark detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Bad recording at line {line}: {message}")]
    Recording { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces the detected faces for each frame, in frame order
///
/// `Ok(None)` means no more frames. An error means no frame is available.
pub trait LandmarkSource {
    fn next_faces(&mut self) -> Result<Option<Vec<LandmarkSet>>, SourceError>;

    /// Release the underlying capture resources
    fn release(&mut self) {}
}

/// Landmarks replayed from a JSON Lines recording
///
/// Each non-blank line is one frame: an array of `{"points": [[x, y], ...]}`
/// objects with an optional `"identity"`. An empty array is a frame without faces.
pub struct RecordedLandmarks<R = BufReader<File>> {
    reader: R,
    line: usize,
    buf: String,
}

impl RecordedLandmarks<BufReader<File>> {
    /// Open a recording file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Replaying landmarks from {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordedLandmarks<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> LandmarkSource for RecordedLandmarks<R> {
    fn next_faces(&mut self) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            let faces: Vec<LandmarkSet> =
                serde_json::from_str(text).map_err(|e| SourceError::Recording {
                    line: self.line,
                    message: e.to_string(),
                })?;
            return Ok(Some(faces));
        }
    }
}

/// Runs a landmark detector over every frame of a frame source
pub struct DetectingSource<F, D> {
    frames: F,
    detector: D,
    last_frame: Option<VideoFrame>,
}

impl<F: FrameSource, D: LandmarkDetector> DetectingSource<F, D> {
    pub fn new(frames: F, detector: D) -> Self {
        Self {
            frames,
            detector,
            last_frame: None,
        }
    }

    /// Most recent frame read, for display or annotation
    pub fn last_frame(&self) -> Option<&VideoFrame> {
        self.last_frame.as_ref()
    }
}

impl<F: FrameSource, D: LandmarkDetector> LandmarkSource for DetectingSource<F, D> {
    fn next_faces(&mut self) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        let Some(frame) = self.frames.read_frame()? else {
            return Ok(None);
        };

        let faces = self.detector.detect(&frame)?;
        debug!("Frame {}: {} faces", frame.sequence, faces.len());
        self.last_frame = Some(frame);
        Ok(Some(faces))
    }

    fn release(&mut self) {
        self.frames.release();
        self.last_frame = None;
    }
}

/// Releases frames from an inner source no faster than one per `interval`
///
/// Frame `n` is due at `first read + n * interval`, so a slow consumer
/// catches up instead of drifting. A zero interval never sleeps.
pub struct Paced<S> {
    inner: S,
    interval: Duration,
    started_at: Option<Instant>,
    frames: u32,
}

impl<S: LandmarkSource> Paced<S> {
    pub fn new(inner: S, interval: Duration) -> Self {
        debug!("Pacing landmark source at {:?} per frame", interval);
        Self {
            inner,
            interval,
            started_at: None,
            frames: 0,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: LandmarkSource> LandmarkSource for Paced<S> {
    fn next_faces(&mut self) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        let start = *self.started_at.get_or_insert_with(Instant::now);
        self.frames = self.frames.saturating_add(1);

        let due = start + self.interval * self.frames;
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }

        self.inner.next_faces()
    }

    fn release(&mut self) {
        self.inner.release();
    }
}

/// In-memory landmark source
#[derive(Debug, Default)]
pub struct MemoryLandmarks {
    frames: VecDeque<Vec<LandmarkSet>>,
    release_count: usize,
}

impl MemoryLandmarks {
    pub fn new(frames: impl IntoIterator<Item = Vec<LandmarkSet>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            release_count: 0,
        }
    }

    /// Number of times `release` has been called
    pub fn release_count(&self) -> usize {
        self.release_count
    }
}

impl LandmarkSource for MemoryLandmarks {
    fn next_faces(&mut self) -> Result<Option<Vec<LandmarkSet>>, SourceError> {
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.frames.clear();
        self.release_count += 1;
    }
}
