//! Healthagg CLI - Command-line interface for the service health aggregator.
//!
//! Provides commands to run an aggregation on a server and to check a
//! service configuration file offline.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{aggregate, validate};
use output::OutputFormat;

/// Exit code when a check ran but did not pass.
const EXIT_CHECK_FAILED: i32 = 2;

/// Healthagg - Service Health Aggregator CLI
#[derive(Parser)]
#[command(
    name = "healthagg",
    author = "Edwin Finlay",
    version,
    about = "Healthagg - Service Health Aggregator",
    long_about = "CLI tool for querying aggregated service health and validating service configuration.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(
        long,
        global = true,
        env = "HEALTHAGG_API_URL",
        default_value = "http://localhost:8000"
    )]
    api_url: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an aggregation on the server and show the report
    Aggregate(aggregate::AggregateArgs),

    /// Check a service configuration file without starting a server
    Validate(validate::ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let format = cli.output;

    let result = match cli.command {
        Commands::Aggregate(args) => match client::ApiClient::new(&cli.api_url) {
            Ok(client) => aggregate::execute(args, &client, format).await,
            Err(e) => Err(e),
        },
        Commands::Validate(args) => validate::execute(args, format),
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(EXIT_CHECK_FAILED),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
