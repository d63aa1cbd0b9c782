//! Prometheus metrics for probes and aggregation runs.
//!
//! Metric names:
//!
//! - `healthagg_probe_duration_seconds{service, outcome}` histogram
//! - `healthagg_probes_total{service, outcome}` counter
//! - `healthagg_runs_total{outcome}` counter
//! - `healthagg_run_duration_seconds{outcome}` histogram
//! - `healthagg_errors_total{code, category}` counter
//!
//! Without an installed recorder every call here is a no-op, which keeps
//! tests free of global state.

use ::metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Histogram buckets for probe and run durations (in seconds).
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the Prometheus recorder.
///
/// Returns `None` when metrics are disabled. The handle renders the text
/// exposition served on `/metrics`.
pub fn init_metrics(enabled: bool) -> anyhow::Result<Option<PrometheusHandle>> {
    if !enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(DURATION_BUCKETS)?
        .install_recorder()?;

    register_metric_descriptions();

    tracing::info!("Metrics initialized");
    Ok(Some(handle))
}

fn register_metric_descriptions() {
    describe_histogram!(
        "healthagg_probe_duration_seconds",
        Unit::Seconds,
        "Time from request start to response headers for one probe"
    );
    describe_counter!("healthagg_probes_total", "Total number of probes issued");
    describe_counter!("healthagg_runs_total", "Total number of aggregation runs");
    describe_histogram!(
        "healthagg_run_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of a whole aggregation run"
    );
    describe_counter!("healthagg_errors_total", "Total number of failed runs by error code");
}

/// Record one probe.
///
/// `outcome` is `healthy`, `down`, or `error` (transport failure).
pub fn record_probe(service: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "healthagg_probes_total",
        "service" => service.to_string(),
        "outcome" => outcome,
    )
    .increment(1);

    histogram!(
        "healthagg_probe_duration_seconds",
        "service" => service.to_string(),
        "outcome" => outcome,
    )
    .record(elapsed.as_secs_f64());
}

/// Record one aggregation run.
///
/// `outcome` is the overall status for completed runs, or the error code.
pub fn record_run(outcome: &str, elapsed: Duration) {
    counter!("healthagg_runs_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("healthagg_run_duration_seconds", "outcome" => outcome.to_string())
        .record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_return_no_handle() {
        let handle = init_metrics(false).unwrap();
        assert!(handle.is_none());
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_probe("svc", "healthy", Duration::from_millis(3));
        record_run("healthy", Duration::from_millis(10));
    }
}
