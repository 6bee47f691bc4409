//! rota-post - Publish the next catalog item to the configured destinations
//!
//! One invocation is one run. An external timer (cron, systemd timer) calls
//! this once per period; the rotation queue guarantees every eligible item is
//! posted once before any repeats.

use std::path::PathBuf;

use clap::Parser;
use librotacast::logging::{LogFormat, LoggingConfig};
use librotacast::{Config, Result, RunReport};

#[derive(Parser, Debug)]
#[command(name = "rota-post")]
#[command(version)]
#[command(about = "Publish the next catalog item to the configured destinations")]
#[command(long_about = "\
rota-post - Publish the next catalog item to the configured destinations

DESCRIPTION:
    Selects the next item from the rotation queue, renders its image, persists
    the updated queue state, and posts the result to every enabled destination
    platform. Destinations fail independently: a rejected upload on one
    platform is reported but never blocks the others and never changes the
    exit code.

USAGE:
    # Normal scheduled invocation (e.g., from cron)
    rota-post

    # Render locally without publishing or touching queue state
    rota-post --dry-run

    # Machine-readable run report
    rota-post --format json

CONFIGURATION:
    Configuration file: ~/.config/rotacast/config.toml
    Override with ROTACAST_CONFIG or --config.

    Run at most one instance at a time. The queue state file is replaced
    atomically, but overlapping invocations are not serialized; that is the
    scheduler's job.

EXIT CODES:
    0 - Run succeeded (selection, render, and queue persistence completed)
    1 - Fatal error (catalog, exclusions, queue, render, or config failure)
    2 - Destination authentication error
    3 - Invalid input
")]
struct Cli {
    /// Render and save the image locally; skip publishing and skip queue
    /// state mutation
    #[arg(short, long)]
    dry_run: bool,

    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format for the run report (text or json)
    #[arg(short, long, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let format = std::env::var("ROTACAST_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);
    let level = std::env::var("ROTACAST_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

    LoggingConfig::new(format, level, verbose).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let report = librotacast::run_from_config(&config, cli.dry_run).await?;

    match cli.format.as_str() {
        "json" => print_json_report(&report),
        _ => print_text_report(&report),
    }

    Ok(())
}

fn print_text_report(report: &RunReport) {
    if report.dry_run {
        println!("[dry run] {} ({})", report.caption, report.image_url);
        println!("{} item(s) still pending in this cycle", report.remaining);
        return;
    }

    println!("posted: {}", report.caption);
    for outcome in &report.outcomes {
        match (&outcome.success, &outcome.post_id, &outcome.error) {
            (true, Some(post_id), _) => println!("  {} ok {}", outcome.platform, post_id),
            (true, None, _) => println!("  {} ok", outcome.platform),
            (false, _, Some(error)) => println!("  {} FAILED {}", outcome.platform, error),
            (false, _, None) => println!("  {} FAILED", outcome.platform),
        }
    }
    println!("{} item(s) still pending in this cycle", report.remaining);
}

fn print_json_report(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize report: {}", e),
    }
}
