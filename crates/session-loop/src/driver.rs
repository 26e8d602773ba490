//! Session driver
//!
//! One `step` reads a frame's faces, runs the analyzer, and closes any window
//! that is due. The clock is passed in so windows can be driven by tests;
//! `run` steps with `Instant::now()` until the session stops.
//!
//! `now` marks the start of a step. Time spent waiting on the source is added
//! to it, so a window opened by the first step covers that frame's capture.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use blink_detection::{FrameAnalysis, FrameAnalyzer};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::resources::ResourceSampler;
use crate::sink::ReportSink;
use crate::source::LandmarkSource;
use crate::stats::{SessionState, SessionStats, SessionSummary, StopReason, WindowReport};
use crate::SessionError;

const SECOND: Duration = Duration::from_secs(1);

/// Requests a running session to stop; cloneable across threads
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop before its next frame
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one driver step
#[derive(Debug)]
pub enum StepOutcome {
    /// A frame was analyzed
    Processed(FrameAnalysis),
    /// The session is stopped and will not process further frames
    Stopped(StopReason),
}

/// Capture → analyze → report loop
pub struct SessionDriver<S> {
    config: SessionConfig,
    analyzer: FrameAnalyzer,
    source: S,
    sinks: Vec<Box<dyn ReportSink>>,
    stop: StopHandle,
    state: SessionState,
    stats: SessionStats,
    windows: u64,
    started_at: Option<Instant>,
    second_started_at: Option<Instant>,
    frames_this_second: u32,
    window_started_at: Option<Instant>,
    /// Recent analyzer latencies (ms), at most `latency_samples`
    latencies: VecDeque<f64>,
    sampler: Option<Box<dyn ResourceSampler>>,
    /// Per-second CPU readings (percent), at most `latency_samples`
    cpu_readings: VecDeque<f64>,
}

impl<S: LandmarkSource> SessionDriver<S> {
    pub fn new(
        config: SessionConfig,
        analyzer: FrameAnalyzer,
        source: S,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        info!(
            "Session driver created: window every {} frames",
            config.nominal_fps
        );

        Ok(Self {
            latencies: VecDeque::with_capacity(config.latency_samples),
            cpu_readings: VecDeque::with_capacity(config.latency_samples),
            config,
            analyzer,
            source,
            sinks: Vec::new(),
            stop: StopHandle::new(),
            state: SessionState::Running,
            stats: SessionStats::default(),
            windows: 0,
            started_at: None,
            second_started_at: None,
            frames_this_second: 0,
            window_started_at: None,
            sampler: None,
        })
    }

    /// Add a report sink
    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Attach CPU and memory readings to window reports
    pub fn with_sampler(mut self, sampler: impl ResourceSampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Use an existing stop handle
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Final summary, once stopped
    pub fn summary(&self) -> Option<SessionSummary> {
        match &self.state {
            SessionState::Stopped(reason) => Some(self.build_summary(reason.clone())),
            SessionState::Running => None,
        }
    }

    /// Run one iteration at time `now`
    pub fn step(&mut self, now: Instant) -> StepOutcome {
        if let SessionState::Stopped(reason) = &self.state {
            return StepOutcome::Stopped(reason.clone());
        }

        if self.stop.is_stopped() {
            info!("Stop requested");
            return self.finish(StopReason::StopRequested);
        }

        let started_at = *self.started_at.get_or_insert(now);
        let second_started_at = *self.second_started_at.get_or_insert(now);
        self.window_started_at.get_or_insert(now);

        let read_timer = Instant::now();
        let faces = match self.source.next_faces() {
            Ok(Some(faces)) => faces,
            Ok(None) => {
                info!("Landmark source exhausted");
                return self.finish(StopReason::SourceExhausted);
            }
            Err(e) => {
                error!("Frame capture failed: {}", e);
                return self.finish(StopReason::SourceFailed(e.to_string()));
            }
        };

        let frame_time = now + read_timer.elapsed();

        // The per-second count covers frames before this one
        if frame_time.saturating_duration_since(second_started_at) >= SECOND {
            self.close_second(frame_time);
        }

        let timer = Instant::now();
        let analysis = self.analyzer.process(&faces);
        self.record_latency(timer.elapsed());

        self.stats.frames_processed += 1;
        self.stats.frames_since_window_start += 1;
        self.stats.window_blink_count += u64::from(analysis.blinks);
        self.stats.elapsed = frame_time.saturating_duration_since(started_at);
        self.frames_this_second += 1;

        if analysis.blinks > 0 {
            debug!(
                "Frame {}: {} blink(s), window count {}",
                self.stats.frames_processed, analysis.blinks, self.stats.window_blink_count
            );
        }

        if self.stats.frames_since_window_start >= self.config.nominal_fps {
            self.close_window(frame_time);
        }

        StepOutcome::Processed(analysis)
    }

    /// Step with the wall clock until the session stops
    pub fn run(mut self) -> SessionSummary {
        info!("Starting blink session");
        loop {
            if let StepOutcome::Stopped(reason) = self.step(Instant::now()) {
                return self.build_summary(reason);
            }
        }
    }

    fn close_second(&mut self, now: Instant) {
        let frames = std::mem::take(&mut self.frames_this_second);
        self.stats.last_second_frames = frames;
        self.second_started_at = Some(now);
        info!("1 sec frame count: {}", frames);
        self.sample_cpu();

        for sink in &mut self.sinks {
            sink.on_second(frames);
        }
    }

    fn close_window(&mut self, now: Instant) {
        let blinks = self.analyzer.get_and_reset_blink_count();
        self.stats.total_blinks += blinks;

        let block_elapsed = self
            .window_started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        self.window_started_at = Some(now);

        if self.cpu_readings.is_empty() {
            self.sample_cpu();
        }
        let memory_percent = self
            .sampler
            .as_mut()
            .map(|sampler| sampler.memory_percent())
            .unwrap_or_default();

        let report = WindowReport {
            epoch_time: chrono::Utc::now().timestamp(),
            blinks,
            total_blinks: self.stats.total_blinks,
            frames: self.stats.frames_since_window_start,
            block_elapsed,
            avg_latency_ms: self.average_latency_ms(),
            avg_cpu_percent: mean(&self.cpu_readings),
            memory_percent,
        };

        self.stats.frames_since_window_start = 0;
        self.stats.window_blink_count = 0;
        self.windows += 1;

        info!(
            "Blinks in last {} frames: {} (total {}, block {:.3}s, latency {:.2}ms, cpu {:.1}%, mem {:.1}%)",
            report.frames,
            report.blinks,
            report.total_blinks,
            report.block_elapsed.as_secs_f64(),
            report.avg_latency_ms,
            report.avg_cpu_percent,
            report.memory_percent
        );

        for sink in &mut self.sinks {
            if let Err(e) = sink.on_window(&report) {
                warn!("Report sink '{}' failed: {}", sink.name(), e);
            }
        }
    }

    fn record_latency(&mut self, latency: Duration) {
        if self.latencies.len() == self.config.latency_samples {
            self.latencies.pop_front();
        }
        self.latencies.push_back(latency.as_secs_f64() * 1_000.0);
    }

    fn average_latency_ms(&self) -> f64 {
        mean(&self.latencies)
    }

    fn sample_cpu(&mut self) {
        let Some(sampler) = self.sampler.as_mut() else {
            return;
        };
        if self.cpu_readings.len() == self.config.latency_samples {
            self.cpu_readings.pop_front();
        }
        self.cpu_readings.push_back(sampler.cpu_percent());
    }

    fn finish(&mut self, reason: StopReason) -> StepOutcome {
        self.source.release();
        self.state = SessionState::Stopped(reason.clone());

        let summary = self.build_summary(reason.clone());
        info!(
            "Session stopped ({:?}): {} frames, {} blinks in {} windows, {} unreported",
            summary.reason,
            summary.stats.frames_processed,
            summary.stats.total_blinks,
            summary.windows,
            summary.trailing_blinks
        );

        for sink in &mut self.sinks {
            sink.on_stop(&summary);
        }

        StepOutcome::Stopped(reason)
    }

    fn build_summary(&self, reason: StopReason) -> SessionSummary {
        SessionSummary {
            reason,
            stats: self.stats.clone(),
            trailing_blinks: self.analyzer.pending_blinks(),
            windows: self.windows,
        }
    }
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
