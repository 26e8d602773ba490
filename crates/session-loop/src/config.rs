//! Session loop configuration

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Session loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Nominal frame rate; a window report is produced every this many frames
    pub nominal_fps: u32,

    /// Number of recent frames averaged for the latency figure
    pub latency_samples: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            nominal_fps: 30,
            latency_samples: 30,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.nominal_fps == 0 {
            return Err(SessionError::Config("nominal_fps must be at least 1".into()));
        }
        if self.latency_samples == 0 {
            return Err(SessionError::Config("latency_samples must be at least 1".into()));
        }
        Ok(())
    }
}
