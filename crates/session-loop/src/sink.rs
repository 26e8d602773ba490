//! Report sinks
//!
//! Receivers for per-second frame counts and per-window blink reports. A sink
//! failure is logged by the driver and never stops the session.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use storage::{BlinkMetricRecord, JsonSequenceFile, Repository};

use crate::stats::{SessionSummary, StopReason, WindowReport};
use crate::SessionError;

/// Receives session reports
pub trait ReportSink: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Called at every N-frame window boundary
    fn on_window(&mut self, report: &WindowReport) -> Result<(), SessionError>;

    /// Called once per wall-clock second with the frames counted in it
    fn on_second(&mut self, _frames: u32) {}

    /// Called once when the session stops
    fn on_stop(&mut self, _summary: &SessionSummary) {}
}

impl From<&WindowReport> for BlinkMetricRecord {
    fn from(report: &WindowReport) -> Self {
        Self {
            epoch_time: report.epoch_time,
            blinks: report.blinks,
            total_blinks: report.total_blinks,
            frames: report.frames,
            block_elapsed_ms: report.block_elapsed.as_millis() as u64,
            avg_latency_ms: report.avg_latency_ms,
            avg_cpu: report.avg_cpu_percent,
            memory_usage: report.memory_percent,
        }
    }
}

/// Stores every window in the metrics repository
pub struct RepositorySink {
    repository: Arc<Repository>,
}

impl RepositorySink {
    pub fn new(repository: Arc<Repository>) -> Self {
        Self { repository }
    }
}

impl ReportSink for RepositorySink {
    fn name(&self) -> &str {
        "repository"
    }

    fn on_window(&mut self, report: &WindowReport) -> Result<(), SessionError> {
        self.repository.insert_metric(report.into())?;
        Ok(())
    }
}

/// Appends each window's blink count to a JSON array file
pub struct JsonBlinkLog {
    file: JsonSequenceFile,
}

impl JsonBlinkLog {
    pub fn new(file: JsonSequenceFile) -> Self {
        Self { file }
    }
}

impl ReportSink for JsonBlinkLog {
    fn name(&self) -> &str {
        "json-log"
    }

    fn on_window(&mut self, report: &WindowReport) -> Result<(), SessionError> {
        self.file.append(&[report.blinks])?;
        Ok(())
    }
}

/// Publishes counters and gauges through the `metrics` facade
#[derive(Debug, Default)]
pub struct MetricsSink;

impl ReportSink for MetricsSink {
    fn name(&self) -> &str {
        "metrics"
    }

    fn on_window(&mut self, report: &WindowReport) -> Result<(), SessionError> {
        metrics::counter!("blink_monitor_blinks_total").increment(report.blinks);
        metrics::counter!("blink_monitor_frames_total").increment(u64::from(report.frames));
        metrics::gauge!("blink_monitor_window_latency_ms").set(report.avg_latency_ms);
        metrics::gauge!("blink_monitor_cpu_percent").set(report.avg_cpu_percent);
        metrics::gauge!("blink_monitor_memory_percent").set(report.memory_percent);
        Ok(())
    }

    fn on_second(&mut self, frames: u32) {
        metrics::gauge!("blink_monitor_fps").set(f64::from(frames));
    }
}

/// Live view of a running session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub running: bool,
    pub total_blinks: u64,
    pub windows: u64,
    pub last_second_frames: u32,
    pub last_window: Option<WindowReport>,
    pub stop_reason: Option<StopReason>,
}

pub type SharedSnapshot = Arc<RwLock<SessionSnapshot>>;

/// Keeps a `SessionSnapshot` current for readers on other threads
pub struct SnapshotSink {
    snapshot: SharedSnapshot,
}

impl SnapshotSink {
    /// Attach to `snapshot` and mark it running
    pub fn new(snapshot: SharedSnapshot) -> Self {
        let mut sink = Self { snapshot };
        sink.update(|s| {
            *s = SessionSnapshot {
                running: true,
                ..Default::default()
            }
        });
        sink
    }

    fn update(&mut self, f: impl FnOnce(&mut SessionSnapshot)) {
        // A poisoned lock only means a reader panicked; the data is still usable
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}

impl ReportSink for SnapshotSink {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn on_window(&mut self, report: &WindowReport) -> Result<(), SessionError> {
        self.update(|s| {
            s.total_blinks = report.total_blinks;
            s.windows += 1;
            s.last_window = Some(report.clone());
        });
        Ok(())
    }

    fn on_second(&mut self, frames: u32) {
        self.update(|s| s.last_second_frames = frames);
    }

    fn on_stop(&mut self, summary: &SessionSummary) {
        self.update(|s| {
            s.running = false;
            s.total_blinks = summary.stats.total_blinks;
            s.windows = summary.windows;
            s.stop_reason = Some(summary.reason.clone());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SessionStats;
    use std::time::Duration;

    fn report(blinks: u64, total_blinks: u64) -> WindowReport {
        WindowReport {
            epoch_time: 1_700_000_000,
            blinks,
            total_blinks,
            frames: 30,
            block_elapsed: Duration::from_millis(1_020),
            avg_latency_ms: 2.5,
            avg_cpu_percent: 17.5,
            memory_percent: 1.25,
        }
    }

    #[test]
    fn test_record_from_report() {
        let record = BlinkMetricRecord::from(&report(3, 7));
        assert_eq!(record.blinks, 3);
        assert_eq!(record.total_blinks, 7);
        assert_eq!(record.block_elapsed_ms, 1_020);
        assert_eq!(record.frames, 30);
        assert_eq!(record.avg_cpu, 17.5);
        assert_eq!(record.memory_usage, 1.25);
    }

    #[test]
    fn test_repository_sink() {
        let repository = Arc::new(Repository::new());
        let mut sink = RepositorySink::new(repository.clone());
        sink.on_window(&report(2, 2)).unwrap();
        sink.on_window(&report(1, 3)).unwrap();

        assert_eq!(repository.metric_count(), 2);
        assert_eq!(repository.latest().unwrap().total_blinks, 3);
    }

    #[test]
    fn test_json_blink_log_appends_counts() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonSequenceFile::new(dir.path().join("blinks.json"));
        let mut sink = JsonBlinkLog::new(file.clone());

        sink.on_window(&report(3, 3)).unwrap();
        sink.on_window(&report(0, 3)).unwrap();

        let counts: Vec<u64> = file.read().iter().filter_map(|v| v.as_u64()).collect();
        assert_eq!(counts, vec![3, 0]);
    }

    #[test]
    fn test_json_blink_log_error_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonSequenceFile::new(dir.path().join("nope").join("blinks.json"));
        let mut sink = JsonBlinkLog::new(file);
        assert!(matches!(sink.on_window(&report(1, 1)), Err(SessionError::Storage(_))));
    }

    #[test]
    fn test_metrics_sink_without_recorder() {
        let mut sink = MetricsSink;
        sink.on_second(29);
        assert!(sink.on_window(&report(1, 1)).is_ok());
    }

    #[test]
    fn test_snapshot_sink_lifecycle() {
        let shared = SharedSnapshot::default();
        let mut sink = SnapshotSink::new(shared.clone());
        assert!(shared.read().unwrap().running);

        sink.on_second(31);
        sink.on_window(&report(2, 5)).unwrap();
        {
            let snapshot = shared.read().unwrap();
            assert_eq!(snapshot.last_second_frames, 31);
            assert_eq!(snapshot.total_blinks, 5);
            assert_eq!(snapshot.windows, 1);
        }

        sink.on_stop(&SessionSummary {
            reason: StopReason::SourceExhausted,
            stats: SessionStats {
                total_blinks: 5,
                ..Default::default()
            },
            trailing_blinks: 0,
            windows: 1,
        });
        let snapshot = shared.read().unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.stop_reason, Some(StopReason::SourceExhausted));
    }
}
