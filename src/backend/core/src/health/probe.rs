//! HTTP probing of a single downstream service.
//!
//! A probe issues exactly one GET, bounded by the service's timeout, and
//! classifies the answer:
//!
//! - status in `[200, 300)` is healthy, with the time to response headers
//! - any other status is down, with detail `HTTP <code>`
//! - a failure before any response is an error, not a classification
//!
//! No retries happen here.

use async_trait::async_trait;
use reqwest::Url;
use std::time::{Duration, Instant};
use tracing::debug;

use super::check::ServiceResult;
use crate::config::ServiceSpec;
use crate::error::{AggregatorError, Result};
use crate::telemetry;

/// User agent sent with every probe.
pub const USER_AGENT: &str = concat!("healthagg/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════════════════════
// Probe Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Checks one service.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe `service` at its already-validated `url`.
    async fn probe(&self, service: &ServiceSpec, url: Url) -> Result<ServiceResult>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP Probe
// ═══════════════════════════════════════════════════════════════════════════════

/// Probe backed by a shared `reqwest` client.
///
/// The client is reused across runs for connection pooling; the timeout is
/// set per request from the [`ServiceSpec`].
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Use a custom HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn classify(service: &ServiceSpec, status: reqwest::StatusCode, elapsed: Duration) -> ServiceResult {
        if status.is_success() {
            ServiceResult::healthy(&service.name, elapsed)
        } else {
            ServiceResult::down(&service.name, format!("HTTP {}", status.as_u16()))
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, service: &ServiceSpec, url: Url) -> Result<ServiceResult> {
        debug!(service = %service.name, url = %url, timeout_ms = service.timeout_ms, "Probing service");

        let start = Instant::now();

        let request = self
            .client
            .get(url)
            .timeout(service.timeout())
            .build()
            .map_err(|source| AggregatorError::RequestConstruction {
                service: service.name.clone(),
                source,
            })?;

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(source) if source.is_builder() => {
                return Err(AggregatorError::RequestConstruction {
                    service: service.name.clone(),
                    source,
                });
            }
            Err(source) => {
                debug!(service = %service.name, error = %source, "Probe failed before a response");
                telemetry::record_probe(&service.name, "error", start.elapsed());
                return Err(AggregatorError::Transport {
                    service: service.name.clone(),
                    source,
                });
            }
        };

        let elapsed = start.elapsed();
        let status = response.status();
        let result = Self::classify(service, status, elapsed);

        debug!(
            service = %service.name,
            http_status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Probe returned"
        );
        telemetry::record_probe(
            &service.name,
            if result.is_healthy() { "healthy" } else { "down" },
            elapsed,
        );

        Ok(result)
    }
}
