//! Configuration management.
//!
//! The service list is read once at startup and never re-read during a run.
//! Values come from a structured file (YAML by default) layered with
//! `HEALTHAGG__`-prefixed environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{AggregatorError, Result};
use crate::telemetry::LogFormat;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "HEALTHAGG_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Aggregation run configuration
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Downstream services, in report order
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (EnvFilter directive)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Install the Prometheus recorder and expose `/metrics`
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// What a run does when a probe fails before any HTTP response arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailurePolicy {
    /// Abort the whole run with a transport error.
    #[default]
    Abort,
    /// Record the failing service as down and keep probing.
    MarkDown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregatorConfig {
    /// Upper bound on a whole run, in milliseconds
    #[serde(default)]
    pub run_timeout_ms: Option<u64>,

    /// Transport failure handling
    #[serde(default)]
    pub on_transport_error: TransportFailurePolicy,
}

impl AggregatorConfig {
    /// The run deadline, if one is configured.
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }
}

/// One downstream service to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Report key
    pub name: String,
    /// Absolute URL probed with a GET
    pub url: String,
    /// Budget for one probe, in milliseconds
    pub timeout_ms: u64,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout_ms,
        }
    }

    /// The probe timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_log_level() -> String { "info".to_string() }
fn default_metrics_enabled() -> bool { true }

impl Config {
    /// Load from the file named by `HEALTHAGG_CONFIG`, falling back to `config.yaml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path)
    }

    /// Load from a specific file path, layered with environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("HEALTHAGG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the service list for problems that would make every report ambiguous.
    ///
    /// URLs are not checked here; a malformed URL fails the run that probes it.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (index, service) in self.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(AggregatorError::configuration(format!(
                    "service #{} has an empty name",
                    index + 1
                )));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(AggregatorError::configuration(format!(
                    "duplicate service name {:?}",
                    service.name
                )));
            }
            if service.timeout_ms == 0 {
                return Err(AggregatorError::configuration(format!(
                    "service {:?} has a zero timeout_ms",
                    service.name
                )));
            }
        }

        Ok(())
    }
}
