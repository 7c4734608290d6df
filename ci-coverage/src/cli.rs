//! Command-line interface: argument parsing and the `report` command.
//!
//! All fetching, correlation and rendering lives in `ci-coverage-core`; this
//! module wires configuration, HTTP defaults and report settings into it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ci_coverage_core::audit::{audit, Progress};
use ci_coverage_core::connector::{ConnectorOptions, HttpConnector};
use ci_coverage_core::report::{render_text, write_html, ReportConfig};
use clap::{Parser, Subcommand};

use crate::load_config::load_config;

/// CLI for ci-coverage: which repositories are built by which CI jobs.
#[derive(Parser)]
#[clap(
    name = "ci-coverage",
    version,
    about = "Correlate git repositories with the CI jobs that build them and report orphans"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll every configured source and write the text and HTML reports
    Report {
        /// Path to the YAML config file
        #[clap(long, default_value = "config.yml")]
        config: PathBuf,
        /// Where to write the HTML report (overwritten)
        #[clap(long, default_value = "output.html")]
        output: PathBuf,
        /// Title of the HTML report
        #[clap(long, default_value = "GitXJenkins report")]
        title: String,
        /// Per-request timeout in seconds; 0 disables it
        #[clap(long, default_value_t = 60)]
        timeout_secs: u64,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Report {
            config,
            output,
            title,
            timeout_secs,
        } => {
            println!("Loading configuration...");
            let configuration = load_config(&config)?;
            println!("Finished loading configuration.");

            let options = ConnectorOptions {
                timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
                ..Default::default()
            };
            let connector = HttpConnector::new(&options).context("Failed to build HTTP client")?;

            tracing::info!(command = "report", "Starting audit");
            let mut print_progress = |event: &Progress| println!("{event}");
            let report = audit(&configuration, &connector, &mut print_progress).await?;

            print!("{}", render_text(&report.repositories));

            let report_config = ReportConfig {
                title,
                output_path: output,
            };
            write_html(&report_config, &configuration, &report, chrono::Utc::now())?;
            tracing::info!(
                command = "report",
                repositories = report.repositories.len(),
                orphans = report.orphans().count(),
                "Report complete"
            );
            Ok(())
        }
    }
}
