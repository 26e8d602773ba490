//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-peer-IP limits using tower_governor. GCRA needs no background
//! process to replenish quota.

use std::sync::Arc;

use axum::Router;
use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;

use crate::ApiError;

/// Governor config keyed by peer IP, with X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Apply the limiter at all
    pub enabled: bool,
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests that can be made immediately
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 1,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// One request every 4 seconds, burst of 2
    pub fn strict() -> Self {
        Self {
            per_second: 4,
            burst_size: 2,
            ..Default::default()
        }
    }

    /// Dashboards polling several endpoints every second
    pub fn lenient() -> Self {
        Self {
            per_second: 1,
            burst_size: 60,
            ..Default::default()
        }
    }
}

/// Build the governor config
///
/// Requires the service to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Arc<DefaultGovernorConfig>, ApiError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or_else(|| {
            ApiError::Config(format!(
                "invalid rate limit: per_second {} burst_size {}",
                config.per_second, config.burst_size
            ))
        })
}

/// Wrap a router in the rate limiter when enabled
pub fn apply(router: Router, config: &RateLimitConfig) -> Result<Router, ApiError> {
    if !config.enabled {
        return Ok(router);
    }
    let governor = create_governor_config(config)?;
    Ok(router.layer(GovernorLayer { config: governor }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.per_second, 1);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn test_presets() {
        assert_eq!(RateLimitConfig::strict().burst_size, 2);
        assert_eq!(RateLimitConfig::lenient().burst_size, 60);
    }

    #[test]
    fn test_create_governor_config() {
        let governor = create_governor_config(&RateLimitConfig::default()).unwrap();
        assert_eq!(Arc::strong_count(&governor), 1);
    }

    #[test]
    fn test_zero_burst_rejected() {
        let config = RateLimitConfig {
            burst_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            create_governor_config(&config),
            Err(ApiError::Config(_))
        ));
    }
}
