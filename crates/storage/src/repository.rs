//! Repository Implementation

use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// Time range used by `query_by_timestamp` when no start is given
pub const DEFAULT_QUERY_WINDOW_SECS: i64 = 60;

/// Blink metrics for one reporting window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlinkMetricRecord {
    /// Unix time the window closed (seconds)
    pub epoch_time: i64,
    /// Blinks detected in the window
    pub blinks: u64,
    /// Session total after this window
    pub total_blinks: u64,
    /// Frames in the window
    pub frames: u32,
    /// Wall-clock time the window took (ms)
    pub block_elapsed_ms: u64,
    /// Mean per-frame analysis latency (ms)
    pub avg_latency_ms: f64,
    /// Mean CPU usage over the window (percent)
    pub avg_cpu: f64,
    /// Process memory share when the window closed (percent)
    pub memory_usage: f64,
}

/// Repository for blink metrics (in-memory, bounded)
pub struct Repository {
    /// Metric records, oldest first
    metrics: Mutex<VecDeque<BlinkMetricRecord>>,
    /// Max records kept (one per second for ~24 hours by default)
    max_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_retention(86_400)
    }

    /// Create a repository that keeps at most `max_records` records
    pub fn with_retention(max_records: usize) -> Self {
        info!("Creating in-memory metrics repository (retention {})", max_records);
        Self {
            metrics: Mutex::new(VecDeque::with_capacity(max_records.min(4096))),
            max_records: max_records.max(1),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<BlinkMetricRecord>>, StorageError> {
        self.metrics
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Insert a metric record
    pub fn insert_metric(&self, record: BlinkMetricRecord) -> Result<(), StorageError> {
        let mut metrics = self.lock()?;

        // Enforce retention
        while metrics.len() >= self.max_records {
            metrics.pop_front();
        }

        debug!("Stored metrics for window ending {}", record.epoch_time);
        metrics.push_back(record);
        Ok(())
    }

    /// Most recent records, newest first
    pub fn fetch_recent(&self, limit: usize) -> Result<Vec<BlinkMetricRecord>, StorageError> {
        let metrics = self.lock()?;
        Ok(metrics.iter().rev().take(limit).cloned().collect())
    }

    /// Records with `start <= epoch_time <= end`, oldest first
    ///
    /// Without a start the range begins `DEFAULT_QUERY_WINDOW_SECS` ago; without
    /// an end it runs to now.
    pub fn query_by_timestamp(
        &self,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<BlinkMetricRecord>, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let start = start.unwrap_or(now - DEFAULT_QUERY_WINDOW_SECS);
        let end = end.unwrap_or(now);

        let metrics = self.lock()?;
        Ok(metrics
            .iter()
            .filter(|r| r.epoch_time >= start && r.epoch_time <= end)
            .cloned()
            .collect())
    }

    /// Latest record, if any
    pub fn latest(&self) -> Option<BlinkMetricRecord> {
        self.metrics.lock().ok().and_then(|m| m.back().cloned())
    }

    /// Get total record count
    pub fn metric_count(&self) -> usize {
        self.metrics.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Clear all data
    pub fn clear(&self) {
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
