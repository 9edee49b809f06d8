//! HYPE volume collector - Entry Point
//!
//! Runs one collection for today's date and exits. Schedule it daily with cron.

use anyhow::Result;
use clap::Parser;
use hvt_collector::config::DEFAULT_CONFIG_PATH;
use hvt_collector::{AppConfig, Collector};
use tracing::info;

/// Daily HYPE and comparator exchange volume collector
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HVT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Output CSV path, overrides `output_path` from the config
    #[arg(short, long)]
    output: Option<String>,

    /// Compute and log the row without writing the table
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    hvt_telemetry::init_logging()?;

    info!("Starting HYPE volume collector v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > HVT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("HVT_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = AppConfig::load(&config_path)?;
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    config.validate()?;
    info!(
        output_path = %config.output_path,
        failure_policy = ?config.failure_policy,
        existing_row = ?config.existing_row,
        "Configuration loaded"
    );

    let collector = Collector::new(&config)?;
    let report = collector.run_today()?;

    info!(
        date = %report.date,
        outcome = %report.outcome,
        persisted = report.persisted,
        "Done"
    );

    Ok(())
}
