//! Blink Metric Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{ApiError, SharedState};
use storage::BlinkMetricRecord;

const MAX_LIMIT: usize = 500;

/// Query parameters for the recent metrics endpoint
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    /// Maximum number of records to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Query parameters for the range endpoint (unix seconds, inclusive)
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Response for metrics endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub data: Vec<BlinkMetricRecord>,
    pub meta: MetricsMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsMeta {
    pub count: usize,
    pub limit: Option<usize>,
}

/// Most recent window records, newest first
pub async fn get_recent(
    State(state): State<SharedState>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let state = state.read().await;
    let limit = params.limit.min(MAX_LIMIT);
    let data = state.repository.fetch_recent(limit)?;

    Ok(Json(MetricsResponse {
        meta: MetricsMeta {
            count: data.len(),
            limit: Some(limit),
        },
        data,
    }))
}

/// Window records in a time range, oldest first
pub async fn get_range(
    State(state): State<SharedState>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<MetricsResponse>, ApiError> {
    if let (Some(start), Some(end)) = (params.start, params.end) {
        if start > end {
            return Err(ApiError::BadRequest(format!(
                "start ({}) is after end ({})",
                start, end
            )));
        }
    }

    let state = state.read().await;
    let data = state
        .repository
        .query_by_timestamp(params.start, params.end)?;

    Ok(Json(MetricsResponse {
        meta: MetricsMeta {
            count: data.len(),
            limit: None,
        },
        data,
    }))
}
