//! HTTP surface for the aggregator.
//!
//! - `GET /health/aggregate` - run an aggregation and return the report
//! - `GET /health/live` - liveness of the aggregator process
//! - `GET /metrics` - Prometheus exposition (404 when metrics are disabled)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::health::{aggregate_health, liveness_check, Aggregator};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-only service list and probe driver
    pub aggregator: Arc<Aggregator>,
    /// Prometheus renderer, present when metrics are enabled
    pub prometheus: Option<PrometheusHandle>,
    /// Fired on shutdown; aborts in-flight runs
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            prometheus: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_prometheus(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.prometheus = handle;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/aggregate", get(aggregate_health))
        .route("/health/live", get(liveness_check))
        .route("/metrics", get(prometheus_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /metrics - Prometheus text exposition
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
