//! Telemetry: structured logging and Prometheus metrics.
//!
//! # Example
//!
//! ```rust,no_run
//! use healthagg_core::config::ObservabilityConfig;
//! use healthagg_core::telemetry::init_telemetry;
//!
//! let handle = init_telemetry(&ObservabilityConfig::default()).expect("telemetry");
//! ```

pub mod logging;
pub mod metrics;

pub use self::logging::{init_logging, LogFormat};
pub use self::metrics::{init_metrics, record_probe, record_run};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ObservabilityConfig;

/// Handle for the installed telemetry stack.
pub struct TelemetryHandle {
    /// Prometheus renderer, present when metrics are enabled
    pub prometheus: Option<PrometheusHandle>,
}

/// Initialize logging and metrics. Call once at startup.
pub fn init_telemetry(config: &ObservabilityConfig) -> anyhow::Result<TelemetryHandle> {
    init_logging(config)?;
    let prometheus = init_metrics(config.metrics_enabled)?;

    Ok(TelemetryHandle { prometheus })
}
