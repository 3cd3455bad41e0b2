//! Detail-Harvest main entry point
//!
//! This is the command-line interface for the Detail-Harvest fetch pipeline.

use anyhow::Context;
use clap::Parser;
use detail_harvest::config::{load_config_with_hash, validate, Config};
use detail_harvest::harvest::{plan_harvest, run_harvest, HarvestOptions};
use detail_harvest::output::{load_statistics, print_report, print_statistics};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Detail-Harvest: a polite, resumable product detail fetcher
///
/// Detail-Harvest fetches every product page in a locator list under a
/// per-host delay and a concurrency ceiling, extracts the embedded product
/// record and checkpoints results after every batch.
#[derive(Parser, Debug)]
#[command(name = "detail-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable product detail fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore the prior checkpoint and fetch every locator
    #[arg(long)]
    fresh: bool,

    /// Show what would be fetched without dispatching any request
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for a checkpoint file and exit
    #[arg(long, value_name = "FILE", num_args = 0..=1, conflicts_with = "dry_run")]
    stats: Option<Option<PathBuf>>,

    /// Override the concurrency ceiling (batch size)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Override the per-host delay in seconds
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.concurrency.is_some() || cli.delay.is_some() {
        apply_overrides(&mut config, cli.concurrency, cli.delay)?;
    }

    if let Some(file) = cli.stats {
        handle_stats(&config, file)
    } else if cli.dry_run {
        handle_dry_run(&config, cli.fresh)
    } else {
        handle_harvest(config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("detail_harvest=info,warn"),
            1 => EnvFilter::new("detail_harvest=debug,info"),
            2 => EnvFilter::new("detail_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides and re-validates the result
fn apply_overrides(
    config: &mut Config,
    concurrency: Option<usize>,
    delay: Option<f64>,
) -> anyhow::Result<()> {
    if let Some(concurrency) = concurrency {
        tracing::info!("Concurrency overridden: {}", concurrency);
        config.harvest.concurrency = concurrency;
    }
    if let Some(delay) = delay {
        tracing::info!("Per-host delay overridden: {}s", delay);
        config.harvest.delay_secs = delay;
    }
    validate(config).context("invalid command-line override")?;
    Ok(())
}

/// Handles the --dry-run mode: shows the batch plan
fn handle_dry_run(config: &Config, fresh: bool) -> anyhow::Result<()> {
    println!("=== Detail-Harvest Dry Run ===\n");

    println!("Harvest Configuration:");
    println!("  Concurrency: {}", config.harvest.concurrency);
    println!("  Per-host delay: {}s", config.harvest.delay_secs);
    println!("  Fetch timeout: {}s", config.harvest.fetch_timeout_secs);
    println!("  Max retries: {}", config.harvest.max_retries);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nPaths:");
    println!("  Input: {}", config.paths.input.display());
    println!("  Prior: {}", config.paths.prior_path().display());
    println!("  Partial: {}", config.paths.partial.display());
    println!("  Final: {}", config.paths.final_output.display());

    let plan = plan_harvest(config, fresh)?;

    println!("\nPlan:");
    println!("  Locators: {}", plan.locators_total);
    println!("  Prior records: {}", plan.prior_records);
    println!("  Already checkpointed: {}", plan.skipped_prior);
    println!("  Duplicate URLs: {}", plan.duplicates);
    println!("  Pending: {}", plan.pending);
    println!("  Batches: {}", plan.batch_sizes.len());

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} pages", plan.pending);

    Ok(())
}

/// Handles the --stats mode: shows statistics for a checkpoint file
fn handle_stats(config: &Config, file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(|| {
        if config.paths.final_output.exists() {
            config.paths.final_output.clone()
        } else {
            config.paths.partial.clone()
        }
    });

    println!("Checkpoint: {}\n", path.display());
    let stats = load_statistics(&path)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh harvest (ignoring prior checkpoint)");
    } else {
        tracing::info!("Starting harvest (will resume from prior checkpoint)");
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received, stopping after the current batch (Ctrl+C again to abort)");
        let _ = stop_tx.send(true);

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Second interrupt, aborting without a final checkpoint");
            std::process::exit(130);
        }
    });

    let options = HarvestOptions {
        fresh,
        stop: Some(stop_rx),
    };

    match run_harvest(config, options).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
