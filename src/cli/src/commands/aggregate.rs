//! Aggregate command.
//!
//! Queries `/health/aggregate` and displays the per-service report.

use anyhow::Result;
use clap::{Args, ValueEnum};
use healthagg_core::health::{AggregatedReport, OverallStatus, ServiceResult};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct AggregateArgs {
    /// Exit non-zero when the overall status is this bad or worse
    #[arg(long, value_enum)]
    fail_on: Option<FailOn>,
}

/// Overall-status threshold for a failing exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Degraded,
    Down,
}

impl FailOn {
    fn threshold(self) -> OverallStatus {
        match self {
            Self::Degraded => OverallStatus::Degraded,
            Self::Down => OverallStatus::Down,
        }
    }

    /// Whether `status` is at or past this threshold.
    pub fn is_breached_by(self, status: OverallStatus) -> bool {
        status >= self.threshold()
    }
}

/// Table row for one probed service.
#[derive(Debug, Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Response (ms)")]
    response_time: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&ServiceResult> for ServiceRow {
    fn from(result: &ServiceResult) -> Self {
        Self {
            name: result.name.clone(),
            status: result.status.to_string(),
            response_time: result
                .response_time_ms
                .map(|ms| format!("{:.2}", ms))
                .unwrap_or_else(|| "-".to_string()),
            error: result.error.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn execute(args: AggregateArgs, client: &ApiClient, format: OutputFormat) -> Result<bool> {
    let report = client.aggregate().await?;

    match format {
        OutputFormat::Table => render_table(&report, client.base_url()),
        _ => output::print_item(&report, format)?,
    }

    let passed = !args
        .fail_on
        .is_some_and(|threshold| threshold.is_breached_by(report.status));
    if !passed {
        output::print_error(&format!("Overall status is {}", report.status));
    }
    Ok(passed)
}

fn render_table(report: &AggregatedReport, api_url: &str) {
    output::print_header("Service Health");
    output::print_detail("Status", &output::colorize_status(report.status.as_str()).to_string());
    output::print_detail("Timestamp", &report.timestamp);
    output::print_detail("API URL", api_url);
    println!();

    let rows: Vec<ServiceRow> = report.services.iter().map(ServiceRow::from).collect();
    output::print_table(&rows);

    match report.status {
        OverallStatus::Healthy => output::print_success(report.status.description()),
        OverallStatus::Degraded => output::print_warning(report.status.description()),
        OverallStatus::Down => output::print_error(report.status.description()),
    }
}
