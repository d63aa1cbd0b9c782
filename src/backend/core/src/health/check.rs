//! Status types, per-service results, and the overall-status reducer.
//!
//! # Status Semantics
//!
//! - A service is **Healthy** when its probe answered 2xx, **Down** otherwise.
//! - The overall verdict is **Healthy** when every service is healthy,
//!   **Down** when none is (or when nothing is configured), and
//!   **Degraded** for any mix.
//!
//! # Example
//!
//! ```rust
//! use healthagg_core::health::{reduce_status, OverallStatus, ServiceResult};
//! use std::time::Duration;
//!
//! let results = vec![
//!     ServiceResult::healthy("billing", Duration::from_millis(12)),
//!     ServiceResult::down("search", "HTTP 503"),
//! ];
//! assert_eq!(reduce_status(&results), OverallStatus::Degraded);
//! ```

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// Service Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Health of one probed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Probe answered with a 2xx status
    Healthy,
    /// Probe answered with any other status, or failed in transport
    Down,
    /// Any status string this build does not recognise
    #[serde(other)]
    Unknown,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Down => write!(f, "down"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Overall Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Verdict over all configured services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every service is healthy
    Healthy,
    /// Some services are healthy, some are not
    Degraded,
    /// No service is healthy
    Down,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        }
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Healthy => "All services are healthy",
            Self::Degraded => "Some services are down",
            Self::Down => "No service is healthy",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Service Result
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of probing one service during one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResult {
    /// Service name, as configured
    pub name: String,

    /// Probe outcome
    pub status: ServiceStatus,

    /// Time to response headers in milliseconds (healthy only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,

    /// Failure detail such as `HTTP 500` (down only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceResult {
    /// A healthy result with the measured response time.
    pub fn healthy(name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            status: ServiceStatus::Healthy,
            response_time_ms: Some(elapsed.as_nanos() as f64 / 1_000_000.0),
            error: None,
        }
    }

    /// A down result with a short human-readable detail.
    pub fn down(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ServiceStatus::Down,
            response_time_ms: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Reducer
// ═══════════════════════════════════════════════════════════════════════════════

/// Fold per-service results into one overall status.
///
/// Every service counts equally, and anything that is not `Healthy`
/// counts as down. An empty slice is `Down`.
pub fn reduce_status(results: &[ServiceResult]) -> OverallStatus {
    if results.is_empty() {
        return OverallStatus::Down;
    }

    let healthy = results.iter().filter(|r| r.is_healthy()).count();

    if healthy == results.len() {
        OverallStatus::Healthy
    } else if healthy == 0 {
        OverallStatus::Down
    } else {
        OverallStatus::Degraded
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Aggregated Report
// ═══════════════════════════════════════════════════════════════════════════════

/// One aggregation run's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    /// Overall verdict
    pub status: OverallStatus,

    /// When the run started (RFC 3339, UTC)
    pub timestamp: String,

    /// One entry per configured service, in configuration order
    pub services: Vec<ServiceResult>,
}

impl AggregatedReport {
    /// Assemble a report, computing the overall status from `services`.
    pub fn new(timestamp: impl Into<String>, services: Vec<ServiceResult>) -> Self {
        Self {
            status: reduce_status(&services),
            timestamp: timestamp.into(),
            services,
        }
    }

    /// Get a specific service by name.
    pub fn get_service(&self, name: &str) -> Option<&ServiceResult> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Current UTC time in RFC 3339 with second precision, e.g. `2024-05-01T12:00:00Z`.
pub fn report_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
