//! Session Loop
//!
//! Drives the capture → analyze → report cycle:
//! - pulls landmark sets from a `LandmarkSource` one frame at a time
//! - feeds them through the blink `FrameAnalyzer`
//! - keeps per-second and per-N-frames windows and hands window reports to sinks
//! - samples process CPU and memory for each window report
//! - stops on request, on source exhaustion, or on capture failure

mod config;
mod driver;
mod resources;
mod sink;
mod source;
mod stats;

pub use config::SessionConfig;
pub use driver::{SessionDriver, StepOutcome, StopHandle};
pub use resources::{ResourceSampler, SystemSampler};
pub use sink::{
    JsonBlinkLog, MetricsSink, ReportSink, RepositorySink, SessionSnapshot, SharedSnapshot,
    SnapshotSink,
};
pub use source::{
    DetectingSource, LandmarkSource, MemoryLandmarks, Paced, RecordedLandmarks, SourceError,
};
pub use stats::{SessionState, SessionStats, SessionSummary, StopReason, WindowReport};

use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detection setup failed: {0}")]
    Detection(#[from] blink_detection::DetectionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Sink error: {0}")]
    Sink(String),
}
