//! Harvest module: the detail fetch pipeline
//!
//! This module contains the core harvesting logic, including:
//! - Structured product record extraction from detail pages
//! - Per-host dispatch rate limiting
//! - Page retrieval with a bounded timeout
//! - Batch scheduling with checkpoints after every batch

mod extractor;
mod fetcher;
mod limiter;
mod scheduler;
mod worker;

pub use extractor::{extract_record, find_product_block};
pub use fetcher::{build_http_client, FetchError, HttpPageSource, PageSource};
pub use limiter::RateLimiter;
pub use scheduler::{dedupe, dedupe_records, BatchScheduler, DedupeResult, HarvestPlan};
pub use worker::{FetchAttempt, FetchWorker};

use crate::config::Config;
use crate::output::RunReport;
use crate::storage::{load_locators, JsonCheckpointStore};
use crate::Result;
use std::sync::Arc;
use tokio::sync::watch;

/// Run-level switches that are not part of the config file
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Ignore the prior checkpoint and fetch every locator
    pub fresh: bool,

    /// Stop signal checked between batches
    pub stop: Option<watch::Receiver<bool>>,
}

/// Runs a complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Build the checkpoint store and create output directories
/// 2. Load the locator list
/// 3. Build the HTTP client, rate limiter and fetch worker
/// 4. Run the batch scheduler to completion or until stopped
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
/// * `options` - Fresh-start flag and optional stop signal
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished and the final output was written
/// * `Err(HarvestError)` - Input, client setup or a checkpoint write failed
pub async fn run_harvest(config: Config, options: HarvestOptions) -> Result<RunReport> {
    let store = build_store(&config, options.fresh);
    store.ensure_dirs()?;

    let locators = load_locators(&config.paths.input)?;
    tracing::info!(
        "Loaded {} locators from {}",
        locators.len(),
        config.paths.input.display()
    );

    let source = HttpPageSource::from_config(&config.user_agent)?;
    let limiter = Arc::new(RateLimiter::new(config.harvest.delay()));
    let worker = FetchWorker::new(Arc::new(source), limiter, config.harvest.fetch_timeout())
        .with_max_retries(config.harvest.max_retries);

    let mut scheduler = BatchScheduler::new(worker, store, config.harvest.concurrency);
    if let Some(stop) = options.stop {
        scheduler = scheduler.with_stop_signal(stop);
    }

    scheduler.run(locators).await
}

/// Computes what a run would fetch without dispatching any request
pub fn plan_harvest(config: &Config, fresh: bool) -> Result<HarvestPlan> {
    let store = build_store(config, fresh);
    let locators = load_locators(&config.paths.input)?;

    let source = HttpPageSource::from_config(&config.user_agent)?;
    let worker = FetchWorker::new(
        Arc::new(source),
        Arc::new(RateLimiter::new(config.harvest.delay())),
        config.harvest.fetch_timeout(),
    );

    BatchScheduler::new(worker, store, config.harvest.concurrency).plan(locators)
}

fn build_store(config: &Config, fresh: bool) -> JsonCheckpointStore {
    let store = JsonCheckpointStore::from_config(&config.paths);
    if fresh {
        tracing::info!("Fresh run: ignoring prior checkpoint");
        store.fresh()
    } else {
        store
    }
}
