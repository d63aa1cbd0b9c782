//! Health HTTP routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregatedReport;
use crate::api::AppState;
use crate::error::AggregatorError;

/// Liveness probe response for the aggregator process itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Whether the service is alive
    pub alive: bool,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl LivenessResponse {
    pub fn alive() -> Self {
        Self {
            alive: true,
            service: "healthagg".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// GET /health/aggregate - Probe every configured service
///
/// Answers 200 whenever the run completes, whatever the overall status.
/// A failed run maps to a 5xx error body without a report.
pub async fn aggregate_health(
    State(state): State<AppState>,
) -> Result<Json<AggregatedReport>, AggregatorError> {
    let report = state.aggregator.run_with_cancellation(&state.shutdown).await?;
    Ok(Json(report))
}

/// GET /health/live - Liveness of the aggregator itself
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(LivenessResponse::alive()))
}
