//! Health aggregation engine
//!
//! Probes every configured downstream service over HTTP and folds the
//! per-service outcomes into one verdict.
//!
//! ## Types
//!
//! - [`validate_url`]: rejects malformed service endpoints before probing
//! - [`Probe`] / [`HttpProbe`]: one bounded-timeout GET per service
//! - [`reduce_status`]: the Healthy/Degraded/Down majority rule
//! - [`Aggregator`]: drives the probes in configuration order and builds
//!   the [`AggregatedReport`]

mod aggregator;
mod check;
mod probe;
mod routes;
mod url;

pub use aggregator::Aggregator;
pub use check::{
    reduce_status, report_timestamp, AggregatedReport, OverallStatus, ServiceResult,
    ServiceStatus,
};
pub use probe::{HttpProbe, Probe, USER_AGENT};
pub use routes::{aggregate_health, liveness_check, LivenessResponse};
pub use url::validate_url;
