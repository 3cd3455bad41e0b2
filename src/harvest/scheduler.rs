//! Batch scheduler - main harvest orchestration logic
//!
//! A run moves through `Initializing → Dedupe → (Dispatching → Checkpointing)*
//! → Finalizing → Done`:
//! - load the prior checkpoint and drop locators it already covers
//! - split the pending list into batches of the concurrency ceiling
//! - run every locator of a batch concurrently and join the whole batch
//! - append the batch's records in list order and persist the accumulator
//! - after the last batch, persist the accumulator to the final target
//!
//! At most `concurrency` fetches are ever in flight, and every checkpoint
//! reflects only fully completed batches.

use crate::harvest::worker::{FetchAttempt, FetchWorker};
use crate::model::{DetailRecord, Locator};
use crate::output::RunReport;
use crate::state::{ItemOutcome, RunPhase};
use crate::storage::{CheckpointStore, CheckpointTarget};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Locators left to fetch after dedup
#[derive(Debug, Clone, Default)]
pub struct DedupeResult {
    /// Locators not yet checkpointed, in input order
    pub pending: Vec<Locator>,

    /// Locators whose URL is already in the prior checkpoint
    pub skipped_prior: usize,

    /// Locators dropped because an earlier input entry had the same URL
    pub duplicates: usize,
}

/// Keeps locators whose URL is not in `prior`, preserving input order
///
/// Repeated URLs within the input are collapsed to their first occurrence.
pub fn dedupe(locators: Vec<Locator>, prior: &[DetailRecord]) -> DedupeResult {
    let done: HashSet<&str> = prior.iter().map(|r| r.url.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = DedupeResult::default();

    for locator in locators {
        if done.contains(locator.url.as_str()) {
            result.skipped_prior += 1;
        } else if !seen.insert(locator.url.clone()) {
            result.duplicates += 1;
        } else {
            result.pending.push(locator);
        }
    }

    result
}

/// Drops records whose URL already appeared earlier in the list
///
/// Returns the kept records and how many were dropped.
pub fn dedupe_records(records: Vec<DetailRecord>) -> (Vec<DetailRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let before = records.len();
    let kept: Vec<DetailRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// What a run would do, computed without dispatching anything
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    pub locators_total: usize,
    pub prior_records: usize,
    pub skipped_prior: usize,
    pub duplicates: usize,
    pub pending: usize,
    pub batch_sizes: Vec<usize>,
}

/// Runs locators through the fetch worker in checkpointed batches
pub struct BatchScheduler<S: CheckpointStore> {
    worker: Arc<FetchWorker>,
    store: S,
    concurrency: usize,
    stop: Option<watch::Receiver<bool>>,
    phase: RunPhase,
}

impl<S: CheckpointStore> BatchScheduler<S> {
    /// Creates a scheduler with the given concurrency ceiling (minimum 1)
    pub fn new(worker: FetchWorker, store: S, concurrency: usize) -> Self {
        Self {
            worker: Arc::new(worker),
            store,
            concurrency: concurrency.max(1),
            stop: None,
            phase: RunPhase::Initializing,
        }
    }

    /// Installs a stop signal, honoured at batch boundaries only
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Computes the batch plan for `locators` against the prior checkpoint
    pub fn plan(&self, locators: Vec<Locator>) -> Result<HarvestPlan> {
        let locators_total = locators.len();
        let prior = self.load_prior()?;
        let deduped = dedupe(locators, &prior);

        Ok(HarvestPlan {
            locators_total,
            prior_records: prior.len(),
            skipped_prior: deduped.skipped_prior,
            duplicates: deduped.duplicates,
            pending: deduped.pending.len(),
            batch_sizes: deduped
                .pending
                .chunks(self.concurrency)
                .map(<[Locator]>::len)
                .collect(),
        })
    }

    /// Runs the whole harvest for `locators`
    ///
    /// Checkpoint read and write failures are fatal; per-locator failures are
    /// counted in the report and otherwise ignored.
    pub async fn run(&mut self, locators: Vec<Locator>) -> Result<RunReport> {
        let mut report = RunReport::new();
        report.locators_total = locators.len();
        self.phase = RunPhase::Initializing;

        let prior = self.load_prior()?;
        report.prior_records = prior.len();

        self.advance(RunPhase::Dedupe)?;
        let deduped = dedupe(locators, &prior);
        report.skipped_prior = deduped.skipped_prior;
        report.duplicate_locators = deduped.duplicates;
        if deduped.duplicates > 0 {
            tracing::warn!(
                "Dropped {} locators with duplicate URLs",
                deduped.duplicates
            );
        }

        let pending = deduped.pending;
        let total_pending = pending.len();
        let batches: Vec<&[Locator]> = pending.chunks(self.concurrency).collect();
        report.batches_planned = batches.len();

        tracing::info!(
            "{} locators, {} already checkpointed, {} pending in {} batches of up to {}",
            report.locators_total,
            report.skipped_prior,
            total_pending,
            batches.len(),
            self.concurrency
        );

        let mut accumulator = prior;
        let mut dispatched = 0;

        for (index, batch) in batches.iter().enumerate() {
            if self.stop_requested() {
                tracing::info!(
                    "Stop requested, skipping remaining {} batches",
                    batches.len() - index
                );
                report.cancelled = true;
                break;
            }

            self.advance(RunPhase::Dispatching)?;
            tracing::info!(
                "Processing batch {}/{}, items {}-{}/{}",
                index + 1,
                batches.len(),
                dispatched + 1,
                dispatched + batch.len(),
                total_pending
            );

            let attempts = self.dispatch_batch(batch).await;
            dispatched += batch.len();

            self.advance(RunPhase::Checkpointing)?;
            let mut batch_records = 0;
            for attempt in attempts {
                report.record(attempt.outcome);
                if let Some(record) = attempt.record {
                    accumulator.push(record);
                    batch_records += 1;
                }
            }

            self.store
                .persist(&accumulator, CheckpointTarget::Partial)?;
            report.batches_completed += 1;

            tracing::info!(
                "Batch {} done: {}/{} extracted, {} records checkpointed",
                index + 1,
                batch_records,
                batch.len(),
                accumulator.len()
            );
        }

        self.advance(RunPhase::Finalizing)?;
        self.store.persist(&accumulator, CheckpointTarget::Final)?;
        self.advance(RunPhase::Done)?;

        report.total_records = accumulator.len();
        report.finish();

        tracing::info!(
            "Harvest completed. New records: {}, total records: {}",
            report.extracted,
            report.total_records
        );

        Ok(report)
    }

    /// Launches every locator of one batch and waits for all of them
    ///
    /// Attempts come back in batch order regardless of completion order.
    async fn dispatch_batch(&self, batch: &[Locator]) -> Vec<FetchAttempt> {
        let mut tasks = JoinSet::new();
        for (slot, locator) in batch.iter().cloned().enumerate() {
            let worker = Arc::clone(&self.worker);
            tasks.spawn(async move { (slot, worker.fetch(&locator).await) });
        }

        let mut attempts: Vec<Option<FetchAttempt>> = vec![None; batch.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, attempt)) => attempts[slot] = Some(attempt),
                Err(e) => tracing::error!("Fetch task aborted: {}", e),
            }
        }

        attempts
            .into_iter()
            .zip(batch)
            .map(|(attempt, locator)| {
                attempt.unwrap_or_else(|| {
                    tracing::warn!(url = %locator.url, "No result from fetch task");
                    FetchAttempt {
                        record: None,
                        outcome: ItemOutcome::Failed,
                        dispatches: 0,
                    }
                })
            })
            .collect()
    }

    /// Loads prior records, keeping the first copy of any repeated URL
    fn load_prior(&self) -> Result<Vec<DetailRecord>> {
        let (prior, dropped) = dedupe_records(self.store.load()?);
        if dropped > 0 {
            tracing::warn!(
                "Prior checkpoint holds {} records with repeated URLs, keeping first copies",
                dropped
            );
        }
        Ok(prior)
    }

    fn advance(&mut self, next: RunPhase) -> Result<()> {
        self.phase = self.phase.transition(next)?;
        tracing::trace!("Run phase: {}", self.phase);
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().map_or(false, |stop| *stop.borrow())
    }
}
