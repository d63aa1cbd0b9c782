//! Validate command.
//!
//! Loads a service configuration file with the server's own loader and
//! checks every service URL, without probing anything.

use anyhow::{Context, Result};
use clap::Args;
use healthagg_core::config::{Config, ServiceSpec};
use healthagg_core::health::validate_url;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the configuration file (YAML, TOML, or JSON)
    config_file: PathBuf,
}

/// Verdict for one configured service.
#[derive(Debug, Tabled, Serialize)]
struct ServiceCheck {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Timeout (ms)")]
    timeout_ms: u64,
    #[tabled(rename = "Verdict")]
    verdict: String,
    #[tabled(skip)]
    #[serde(skip)]
    valid: bool,
}

fn check_services(services: &[ServiceSpec]) -> Vec<ServiceCheck> {
    services
        .iter()
        .map(|service| {
            let outcome = validate_url(&service.url);
            ServiceCheck {
                name: service.name.clone(),
                url: service.url.clone(),
                timeout_ms: service.timeout_ms,
                verdict: match &outcome {
                    Ok(_) => "ok".to_string(),
                    Err(e) => e.to_string(),
                },
                valid: outcome.is_ok(),
            }
        })
        .collect()
}

pub fn execute(args: ValidateArgs, format: OutputFormat) -> Result<bool> {
    let path = args
        .config_file
        .to_str()
        .context("Configuration path is not valid UTF-8")?;
    let config = Config::from_file(path)
        .with_context(|| format!("Failed to load {}", args.config_file.display()))?;

    let checks = check_services(&config.services);
    let invalid = checks.iter().filter(|c| !c.valid).count();

    match format {
        OutputFormat::Table => {
            output::print_header("Configured Services");
            output::print_table(&checks);
            if invalid == 0 {
                output::print_success(&format!("{} service(s) valid", checks.len()));
            } else {
                output::print_error(&format!(
                    "{} of {} service(s) invalid",
                    invalid,
                    checks.len()
                ));
            }
        }
        _ => output::print_item(&checks, format)?,
    }

    Ok(invalid == 0)
}
