//! The aggregation run: validate, probe, and reduce every configured service.
//!
//! Services are probed strictly one after another, in configuration order.
//! The run is a single linear pass with early abort: any fatal error ends
//! it without a report.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::check::{report_timestamp, AggregatedReport, ServiceResult};
use super::probe::{HttpProbe, Probe};
use super::url::validate_url;
use crate::config::{Config, ServiceSpec, TransportFailurePolicy};
use crate::error::{AggregatorError, Result};
use crate::telemetry;

/// Owns the configured service list and drives probes over it.
///
/// The service list never changes after construction. Wrap the aggregator
/// in an `Arc` to share it between concurrent callers; runs are independent.
pub struct Aggregator {
    services: Vec<ServiceSpec>,
    probe: Arc<dyn Probe>,
    transport_policy: TransportFailurePolicy,
    run_timeout: Option<Duration>,
}

impl Aggregator {
    /// Create an aggregator that probes over HTTP with default settings.
    pub fn new(services: Vec<ServiceSpec>) -> Self {
        Self {
            services,
            probe: Arc::new(HttpProbe::new()),
            transport_policy: TransportFailurePolicy::default(),
            run_timeout: None,
        }
    }

    /// Create from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.services.clone())
            .with_transport_policy(config.aggregator.on_transport_error)
            .with_run_timeout(config.aggregator.run_timeout())
    }

    /// Replace the probe implementation.
    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = probe;
        self
    }

    /// Set the transport failure policy.
    pub fn with_transport_policy(mut self, policy: TransportFailurePolicy) -> Self {
        self.transport_policy = policy;
        self
    }

    /// Bound the duration of every run.
    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// The configured services, in report order.
    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    /// Run one aggregation pass.
    pub async fn run(&self) -> Result<AggregatedReport> {
        self.run_with_cancellation(&CancellationToken::new()).await
    }

    /// Run one aggregation pass, aborting as soon as `cancel` fires.
    ///
    /// Cancellation drops the in-flight probe and skips every remaining
    /// service; the run then fails with [`AggregatorError::Cancelled`].
    pub async fn run_with_cancellation(&self, cancel: &CancellationToken) -> Result<AggregatedReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("aggregation_run", %run_id, services = self.services.len());
        let started = Instant::now();

        let outcome = async {
            match self.run_timeout {
                Some(limit) => match tokio::time::timeout(limit, self.probe_all(cancel)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AggregatorError::DeadlineExceeded(limit)),
                },
                None => self.probe_all(cancel).await,
            }
        }
        .instrument(span.clone())
        .await;

        let elapsed = started.elapsed();
        span.in_scope(|| match &outcome {
            Ok(report) => {
                info!(
                    status = %report.status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Aggregation run complete"
                );
                telemetry::record_run(report.status.as_str(), elapsed);
            }
            Err(err) => {
                telemetry::record_run(err.code().as_str(), elapsed);
            }
        });

        outcome
    }

    async fn probe_all(&self, cancel: &CancellationToken) -> Result<AggregatedReport> {
        let timestamp = report_timestamp();
        let mut results = Vec::with_capacity(self.services.len());

        for service in &self.services {
            if cancel.is_cancelled() {
                return Err(AggregatorError::Cancelled);
            }

            let url = validate_url(&service.url)?;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AggregatorError::Cancelled),
                outcome = self.probe.probe(service, url) => outcome,
            };

            results.push(self.settle(service, outcome)?);
        }

        Ok(AggregatedReport::new(timestamp, results))
    }

    /// Apply the transport failure policy to one probe outcome.
    fn settle(&self, service: &ServiceSpec, outcome: Result<ServiceResult>) -> Result<ServiceResult> {
        match outcome {
            Err(AggregatorError::Transport { source, .. })
                if self.transport_policy == TransportFailurePolicy::MarkDown =>
            {
                let detail = if source.is_timeout() {
                    format!("timeout after {}ms", service.timeout_ms)
                } else {
                    source.to_string()
                };
                warn!(service = %service.name, error = %detail, "Probe failed, marking service down");
                Ok(ServiceResult::down(&service.name, detail))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::health::{OverallStatus, ServiceStatus};
    use async_trait::async_trait;
    use reqwest::Url;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from a fixed table and records which services were probed.
    struct StubProbe {
        answers: HashMap<String, ServiceStatus>,
        delay: Duration,
        probed: Mutex<Vec<String>>,
    }

    impl StubProbe {
        fn new(answers: &[(&str, ServiceStatus)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(name, status)| (name.to_string(), *status))
                    .collect(),
                delay: Duration::ZERO,
                probed: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn probed(&self) -> Vec<String> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Probe for StubProbe {
        async fn probe(&self, service: &ServiceSpec, _url: Url) -> Result<ServiceResult> {
            self.probed.lock().unwrap().push(service.name.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(match self.answers.get(&service.name) {
                Some(ServiceStatus::Healthy) => {
                    ServiceResult::healthy(&service.name, Duration::from_millis(1))
                }
                _ => ServiceResult::down(&service.name, "HTTP 500"),
            })
        }
    }

    fn spec(name: &str) -> ServiceSpec {
        ServiceSpec::new(name, format!("http://{name}.internal:8080/health"), 1000)
    }

    #[tokio::test]
    async fn test_report_preserves_configuration_order() {
        let probe = Arc::new(StubProbe::new(&[
            ("c", ServiceStatus::Healthy),
            ("a", ServiceStatus::Healthy),
            ("b", ServiceStatus::Healthy),
        ]));
        let aggregator =
            Aggregator::new(vec![spec("c"), spec("a"), spec("b")]).with_probe(probe.clone());

        let report = aggregator.run().await.unwrap();
        let names: Vec<_> = report.services.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(probe.probed(), ["c", "a", "b"]);
        assert_eq!(report.status, OverallStatus::Healthy);
    }

    #[tokio::test]
    async fn test_mixed_results_are_degraded() {
        let probe = Arc::new(StubProbe::new(&[
            ("a", ServiceStatus::Healthy),
            ("b", ServiceStatus::Down),
        ]));
        let report = Aggregator::new(vec![spec("a"), spec("b")])
            .with_probe(probe)
            .run()
            .await
            .unwrap();

        assert_eq!(report.status, OverallStatus::Degraded);
        assert_eq!(report.services[1].error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_no_services_is_down() {
        let probe = Arc::new(StubProbe::new(&[]));
        let report = Aggregator::new(Vec::new()).with_probe(probe).run().await.unwrap();

        assert_eq!(report.status, OverallStatus::Down);
        assert!(report.services.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_aborts_and_skips_remaining() {
        let probe = Arc::new(StubProbe::new(&[
            ("a", ServiceStatus::Healthy),
            ("c", ServiceStatus::Healthy),
        ]));
        let services = vec![
            spec("a"),
            ServiceSpec::new("b", "not-a-valid-url", 1000),
            spec("c"),
        ];

        let err = Aggregator::new(services)
            .with_probe(probe.clone())
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidUrl);
        assert_eq!(probe.probed(), ["a"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let probe = Arc::new(StubProbe::new(&[("a", ServiceStatus::Healthy)]));
        let aggregator = Aggregator::new(vec![spec("a")]).with_probe(probe.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = aggregator.run_with_cancellation(&cancel).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Cancelled));
        assert!(probe.probed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight_probe() {
        let probe = Arc::new(
            StubProbe::new(&[("a", ServiceStatus::Healthy), ("b", ServiceStatus::Healthy)])
                .with_delay(Duration::from_secs(30)),
        );
        let aggregator = Aggregator::new(vec![spec("a"), spec("b")]).with_probe(probe.clone());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = aggregator.run_with_cancellation(&cancel).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Cancelled));
        assert_eq!(probe.probed(), ["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline() {
        let probe = Arc::new(
            StubProbe::new(&[("a", ServiceStatus::Healthy)]).with_delay(Duration::from_secs(5)),
        );
        let err = Aggregator::new(vec![spec("a")])
            .with_probe(probe)
            .with_run_timeout(Some(Duration::from_secs(1)))
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DeadlineExceeded);
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_repeated_runs_agree() {
        let probe = Arc::new(StubProbe::new(&[
            ("a", ServiceStatus::Healthy),
            ("b", ServiceStatus::Down),
        ]));
        let aggregator = Aggregator::new(vec![spec("a"), spec("b")]).with_probe(probe);

        let first = aggregator.run().await.unwrap();
        let second = aggregator.run().await.unwrap();
        assert_eq!(first.status, second.status);
        assert_eq!(first.services.len(), second.services.len());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.services = vec![spec("a")];
        config.aggregator.on_transport_error = TransportFailurePolicy::MarkDown;
        config.aggregator.run_timeout_ms = Some(2500);

        let aggregator = Aggregator::from_config(&config);
        assert_eq!(aggregator.services().len(), 1);
        assert_eq!(aggregator.transport_policy, TransportFailurePolicy::MarkDown);
        assert_eq!(aggregator.run_timeout, Some(Duration::from_millis(2500)));
    }
}
