//! # Healthagg Core
//!
//! Polls a configured set of downstream HTTP services, measures their
//! reachability and latency, and reports an aggregated health verdict.
//!
//! ## Architecture
//!
//! - **Health**: URL validation, HTTP probing, status reduction, and the
//!   sequential aggregation run
//! - **API**: Axum routes exposing the aggregate report
//! - **Config**: service list and server settings, loaded once at startup
//! - **Telemetry**: structured logging and Prometheus metrics

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod telemetry;

pub use error::{AggregatorError, ErrorCode, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ServiceSpec, TransportFailurePolicy};
    pub use crate::error::{AggregatorError, ErrorCode, Result};
    pub use crate::health::{
        reduce_status, validate_url, AggregatedReport, Aggregator, HttpProbe, OverallStatus,
        Probe, ServiceResult, ServiceStatus,
    };
}
