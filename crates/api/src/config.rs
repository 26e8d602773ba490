//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (`blink-monitor.toml`, or the path in `BLINK_CONFIG`), then
//! `BLINK__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};

use blink_detection::BlinkConfig;
use camera_capture::CameraConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use session_loop::SessionConfig;

use crate::rate_limit::RateLimitConfig;
use crate::ApiError;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "BLINK_CONFIG";

/// Config file looked up in the working directory (any supported extension)
const DEFAULT_CONFIG_NAME: &str = "blink-monitor";

const ENV_PREFIX: &str = "BLINK";

/// Where landmarks come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON Lines landmark recording, one frame per line
    pub landmarks: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            landmarks: PathBuf::from("landmarks.jsonl"),
        }
    }
}

/// Report persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON array file that receives each window's blink count
    pub json_path: Option<PathBuf>,
    /// Window records kept in memory for the API
    pub retention: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            json_path: Some(PathBuf::from("blink_counts.json")),
            retention: 86_400,
        }
    }
}

/// HTTP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind: String,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8080".to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: BlinkConfig,
    pub session: SessionConfig,
    pub camera: CameraConfig,
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from the default locations and the process environment
    pub fn load() -> Result<Self, ApiError> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load with an explicit config file (required when given)
    pub fn load_from(path: Option<&Path>) -> Result<Self, ApiError> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        Self::build(path, env)
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self, ApiError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.detection
            .validate()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        self.session
            .validate()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        if self.storage.retention == 0 {
            return Err(ApiError::Config("storage.retention must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blink_detection::FaceTracking;
    use config::Map;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::build(None, env(&[])).unwrap();
        assert_eq!(config.detection.ear_threshold, 0.25);
        assert_eq!(config.detection.cooldown_frames, 10);
        assert_eq!(config.session.nominal_fps, 30);
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 720);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blink.toml");
        std::fs::write(
            &path,
            "[detection]\near_threshold = 0.21\nface_tracking = \"shared\"\n\n\
             [session]\nnominal_fps = 25\n\n\
             [logging]\njson = true\n",
        )
        .unwrap();

        let config = AppConfig::build(Some(&path), env(&[])).unwrap();
        assert_eq!(config.detection.ear_threshold, 0.21);
        assert_eq!(config.detection.face_tracking, FaceTracking::Shared);
        assert_eq!(config.detection.cooldown_frames, 10);
        assert_eq!(config.session.nominal_fps, 25);
        assert!(config.logging.json);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blink.toml");
        std::fs::write(&path, "[session]\nnominal_fps = 25\n").unwrap();

        let config = AppConfig::build(
            Some(&path),
            env(&[
                ("BLINK__SESSION__NOMINAL_FPS", "60"),
                ("BLINK__DETECTION__COOLDOWN_FRAMES", "4"),
            ]),
        )
        .unwrap();
        assert_eq!(config.session.nominal_fps, 60);
        assert_eq!(config.detection.cooldown_frames, 4);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::build(Some(&dir.path().join("absent.toml")), env(&[]));
        assert!(matches!(result, Err(ApiError::Settings(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = AppConfig::build(None, env(&[("BLINK__SESSION__NOMINAL_FPS", "0")]));
        assert!(matches!(result, Err(ApiError::Config(_))));

        let result = AppConfig::build(None, env(&[("BLINK__DETECTION__EAR_THRESHOLD", "-1")]));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
