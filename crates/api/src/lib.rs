//! Blink Monitor API Server
//!
//! REST API over the live detection session and its stored window reports,
//! plus configuration and logging setup for the `blink-monitor` binary.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod rate_limit;
mod routes;

pub use crate::config::{AppConfig, LoggingConfig, ServerConfig, SourceConfig, StorageConfig};

use session_loop::{SessionSnapshot, SharedSnapshot};
use storage::{Repository, StorageError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Window reports from the running session
    pub repository: Arc<Repository>,
    /// Live session view kept current by the driver
    pub snapshot: SharedSnapshot,
    /// Prometheus recorder handle, when installed
    pub prometheus: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    /// Create new application state
    pub fn new(repository: Arc<Repository>, snapshot: SharedSnapshot) -> Self {
        Self {
            repository,
            snapshot,
            prometheus: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Copy of the live session snapshot
    pub fn session_snapshot(&self) -> SessionSnapshot {
        match self.snapshot.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub session: SessionHealth,
    pub stored_windows: usize,
}

/// Detection session health
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionHealth {
    pub running: bool,
    pub total_blinks: u64,
    pub last_second_frames: u32,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/metrics", get(routes::metrics::get_recent))
        .route("/api/v1/metrics/range", get(routes::metrics::get_range))
        .route("/api/v1/session", get(routes::session::get_session))
        .route("/metrics", get(prometheus_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;
    let snapshot = state.session_snapshot();

    Json(HealthResponse {
        status: if snapshot.running { "healthy" } else { "idle" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session: SessionHealth {
            running: snapshot.running,
            total_blinks: snapshot.total_blinks,
            last_second_frames: snapshot.last_second_frames,
        },
        stored_windows: state.repository.metric_count(),
    })
}

/// Prometheus text exposition
async fn prometheus_handler(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}

/// Run the server until it fails
pub async fn run_server(config: ServerConfig, state: SharedState) -> Result<(), ApiError> {
    let app = rate_limit::apply(create_router(state), &config.rate_limit)?;

    info!("Starting API server on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
