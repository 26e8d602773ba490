//! Session state and statistics

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a session stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop signal or quit request
    StopRequested,
    /// The source has no more frames
    SourceExhausted,
    /// Capture or detection failed
    SourceFailed(String),
}

/// Driver lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopped(StopReason),
}

/// Running counters owned by the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Blinks reported across all completed windows
    pub total_blinks: u64,
    /// Frames since the current window began
    pub frames_since_window_start: u32,
    /// Blinks seen in the current window so far
    pub window_blink_count: u64,
    /// Frames processed in the whole session
    pub frames_processed: u64,
    /// Frames counted in the last completed wall-clock second
    pub last_second_frames: u32,
    /// Time since the first frame
    pub elapsed: Duration,
}

/// Report for one block of N frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    /// Unix time the window closed (seconds)
    pub epoch_time: i64,
    /// Blinks in this window
    pub blinks: u64,
    /// Session total including this window
    pub total_blinks: u64,
    /// Frames in this window
    pub frames: u32,
    /// Wall-clock time the block of frames took
    pub block_elapsed: Duration,
    /// Mean analyzer latency over the recent frames (ms)
    pub avg_latency_ms: f64,
    /// Mean of the recent per-second CPU readings (percent)
    pub avg_cpu_percent: f64,
    /// Process share of system memory when the window closed (percent)
    pub memory_percent: f64,
}

/// Final state of a stopped session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub reason: StopReason,
    pub stats: SessionStats,
    /// Blinks in the incomplete final window, not included in `stats.total_blinks`
    pub trailing_blinks: u64,
    /// Window reports produced
    pub windows: u64,
}

impl SessionSummary {
    /// Every blink detected during the session
    pub fn all_blinks(&self) -> u64 {
        self.stats.total_blinks + self.trailing_blinks
    }
}
