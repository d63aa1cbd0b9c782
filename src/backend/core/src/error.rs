//! Error handling for the aggregation engine.
//!
//! This module provides:
//! - [`AggregatorError`], the single error type returned by a failed run
//! - [`ErrorCode`], stable machine-readable codes for API responses
//! - HTTP status mapping and severity-scaled logging
//!
//! A failed run never produces a report. HTTP non-2xx answers from a
//! downstream service are not errors at all; they fold into a `Down`
//! [`ServiceResult`](crate::health::ServiceResult).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// A specialized Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregatorError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Probe Errors (1000-1099)
    InvalidUrl,
    RequestConstruction,
    TransportError,

    // Run Lifecycle Errors (1100-1199)
    Cancelled,
    DeadlineExceeded,

    // Configuration Errors (5000-5099)
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::InvalidUrl => 1000,
            Self::RequestConstruction => 1001,
            Self::TransportError => 1002,

            Self::Cancelled => 1100,
            Self::DeadlineExceeded => 1101,

            Self::ConfigurationError => 5000,
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Every code maps to a server error: a failed run is the aggregator's
    /// failure, not the caller's.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidUrl | Self::RequestConstruction | Self::ConfigurationError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::TransportError => StatusCode::BAD_GATEWAY,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "probe",
            1100..=1199 => "run",
            5000..=5099 => "configuration",
            _ => "unknown",
        }
    }

    /// Stable string form used in API bodies and metric labels.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "INVALID_URL",
            Self::RequestConstruction => "REQUEST_CONSTRUCTION",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller-driven outcomes (cancellation)
    Low,
    /// Operational issues (downstream unreachable, deadlines)
    Medium,
    /// Misconfiguration that fails every run until fixed
    High,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::Cancelled => Self::Low,
            ErrorCode::TransportError | ErrorCode::DeadlineExceeded => Self::Medium,
            ErrorCode::InvalidUrl
            | ErrorCode::RequestConstruction
            | ErrorCode::ConfigurationError => Self::High,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors that abort an aggregation run (or startup, for configuration).
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// A configured service URL failed parsing or lacks a scheme or host.
    #[error("the URL {url:?} is invalid: {detail}")]
    InvalidUrl { url: String, detail: String },

    /// The outbound request could not be built.
    #[error("failed to build request for service {service}: {source}")]
    RequestConstruction {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    /// Network-level failure before any response arrived.
    #[error("transport error probing service {service}: {source}")]
    Transport {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    /// The run was cancelled by the caller.
    #[error("aggregation run cancelled")]
    Cancelled,

    /// The run exceeded its configured deadline.
    #[error("aggregation run exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AggregatorError {
    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            Self::RequestConstruction { .. } => ErrorCode::RequestConstruction,
            Self::Transport { .. } => ErrorCode::TransportError,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::DeadlineExceeded(_) => ErrorCode::DeadlineExceeded,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> StatusCode {
        self.code().http_status()
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code())
    }

    /// Whether the error came from a transport failure that timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout(),
            Self::DeadlineExceeded(_) => true,
            _ => false,
        }
    }

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code();
        let category = code.category();
        let status = self.http_status().as_u16();

        match self.severity() {
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    error = %self,
                    "Aggregation failed"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    error = %self,
                    "Aggregation failed"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    "Aggregation aborted"
                );
            }
        }
    }

    /// Record error metrics.
    pub fn record_metrics(&self) {
        let code = self.code();
        counter!(
            "healthagg_errors_total",
            "code" => code.as_str(),
            "category" => code.category()
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Error Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error body returned to API clients. Deliberately carries no report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Inner error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<&AggregatorError> for ErrorResponse {
    fn from(err: &AggregatorError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code(),
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for AggregatorError {
    fn into_response(self) -> Response {
        self.log();
        self.record_metrics();

        let status = self.http_status();
        let body = ErrorResponse::from(&self);

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AggregatorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_server_errors() {
        for code in [
            ErrorCode::InvalidUrl,
            ErrorCode::RequestConstruction,
            ErrorCode::TransportError,
            ErrorCode::Cancelled,
            ErrorCode::DeadlineExceeded,
            ErrorCode::ConfigurationError,
        ] {
            assert!(code.http_status().is_server_error(), "{code} should map to 5xx");
        }
    }

    #[test]
    fn test_error_code_categories() {
        assert_eq!(ErrorCode::InvalidUrl.category(), "probe");
        assert_eq!(ErrorCode::TransportError.category(), "probe");
        assert_eq!(ErrorCode::Cancelled.category(), "run");
        assert_eq!(ErrorCode::ConfigurationError.category(), "configuration");
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InvalidUrl).unwrap();
        assert_eq!(json, "\"INVALID_URL\"");
        assert_eq!(ErrorCode::DeadlineExceeded.to_string(), "DEADLINE_EXCEEDED");
    }

    #[test]
    fn test_invalid_url_message() {
        let err = AggregatorError::invalid_url("example.com", "scheme is empty");
        assert_eq!(err.code(), ErrorCode::InvalidUrl);
        assert!(err.to_string().contains("example.com"));
        assert!(err.to_string().contains("scheme is empty"));
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_cancelled_is_low_severity() {
        let err = AggregatorError::Cancelled;
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.http_status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_deadline_is_timeout() {
        let err = AggregatorError::DeadlineExceeded(Duration::from_millis(50));
        assert!(err.is_timeout());
        assert_eq!(err.http_status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_error_response_body() {
        let err = AggregatorError::configuration("duplicate service name \"a\"");
        let body = ErrorResponse::from(&err);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], "CONFIGURATION_ERROR");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("duplicate service name"));
    }
}
