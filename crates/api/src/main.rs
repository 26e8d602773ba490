//! Blink Monitor - Main Entry Point

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api::{init_logging, run_server, AppConfig, AppState};
use blink_detection::FrameAnalyzer;
use metrics_exporter_prometheus::PrometheusBuilder;
use session_loop::{
    JsonBlinkLog, MetricsSink, Paced, RecordedLandmarks, RepositorySink, SessionDriver,
    SharedSnapshot, SnapshotSink, SystemSampler,
};
use storage::{JsonSequenceFile, Repository};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

fn describe_metrics() {
    metrics::describe_counter!("blink_monitor_blinks_total", "Blinks reported across windows");
    metrics::describe_counter!("blink_monitor_frames_total", "Frames in reported windows");
    metrics::describe_gauge!("blink_monitor_fps", "Frames processed in the last second");
    metrics::describe_gauge!(
        "blink_monitor_window_latency_ms",
        "Mean analyzer latency over recent frames"
    );
    metrics::describe_gauge!("blink_monitor_cpu_percent", "Mean CPU usage over the last window");
    metrics::describe_gauge!(
        "blink_monitor_memory_percent",
        "Process share of system memory"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.logging);

    info!("=== Blink Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Camera {}x{} @ {} fps, EAR threshold {}, cooldown {} frames",
        config.camera.width,
        config.camera.height,
        config.camera.fps,
        config.detection.ear_threshold,
        config.detection.cooldown_frames
    );

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;
    describe_metrics();

    let repository = Arc::new(Repository::with_retention(config.storage.retention));
    let snapshot = SharedSnapshot::default();

    let source = RecordedLandmarks::open(&config.source.landmarks).with_context(|| {
        format!(
            "opening landmark recording {}",
            config.source.landmarks.display()
        )
    })?;
    // Replay at the camera frame rate
    let source = Paced::new(
        source,
        Duration::from_nanos(config.camera.frame_interval_ns()),
    );
    let analyzer = FrameAnalyzer::new(config.detection.clone())?;

    let mut driver = SessionDriver::new(config.session.clone(), analyzer, source)?
        .with_sink(RepositorySink::new(repository.clone()))
        .with_sink(MetricsSink)
        .with_sink(SnapshotSink::new(snapshot.clone()))
        .with_sampler(SystemSampler::new());
    if let Some(path) = &config.storage.json_path {
        info!("Appending window blink counts to {}", path.display());
        driver = driver.with_sink(JsonBlinkLog::new(JsonSequenceFile::new(path)));
    }

    let stop = driver.stop_handle();
    let mut session = tokio::task::spawn_blocking(move || driver.run());

    let server = config.server.enabled.then(|| {
        let state = Arc::new(RwLock::new(
            AppState::new(repository.clone(), snapshot.clone()).with_prometheus(prometheus),
        ));
        let server_config = config.server.clone();
        tokio::spawn(async move {
            if let Err(e) = run_server(server_config, state).await {
                error!("API server failed: {}", e);
            }
        })
    });

    let (summary, interrupted) = tokio::select! {
        result = &mut session => (result?, false),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Cannot listen for Ctrl-C: {}", e);
            }
            info!("Stopping session");
            stop.stop();
            (session.await?, true)
        }
    };

    info!(
        "Session ended ({:?}): {} frames, {} blinks",
        summary.reason,
        summary.stats.frames_processed,
        summary.all_blinks()
    );

    if let Some(server) = server {
        if !interrupted {
            info!("API still serving stored windows; press Ctrl-C to exit");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
            }
        }
        server.abort();
    }

    Ok(())
}
