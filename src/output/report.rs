//! End-of-run report
//!
//! The batch scheduler fills a `RunReport` as batches complete; the CLI
//! prints it when the run ends.

use crate::state::ItemOutcome;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Counters describing one harvest run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Locators in the input list
    pub locators_total: usize,

    /// Input locators dropped because an earlier one had the same URL
    pub duplicate_locators: usize,

    /// Locators skipped because the prior checkpoint already has them
    pub skipped_prior: usize,

    /// Records loaded from the prior checkpoint
    pub prior_records: usize,

    /// Locators dispatched this run
    pub attempted: usize,

    /// Records produced this run
    pub extracted: usize,

    /// Outcome counts for every attempted locator
    pub outcomes: BTreeMap<ItemOutcome, usize>,

    pub batches_planned: usize,
    pub batches_completed: usize,

    /// Records in the final output
    pub total_records: usize,

    /// Run stopped at a batch boundary before all batches ran
    pub cancelled: bool,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            locators_total: 0,
            duplicate_locators: 0,
            skipped_prior: 0,
            prior_records: 0,
            attempted: 0,
            extracted: 0,
            outcomes: BTreeMap::new(),
            batches_planned: 0,
            batches_completed: 0,
            total_records: 0,
            cancelled: false,
        }
    }

    /// Counts one attempted locator
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.extracted += 1;
        }
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    /// Attempted locators that produced no record
    pub fn failed(&self) -> usize {
        self.attempted - self.extracted
    }

    /// Count for a single outcome
    pub fn outcome_count(&self, outcome: ItemOutcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the report to stdout
pub fn print_report(report: &RunReport) {
    println!("=== Harvest Summary ===\n");

    println!("Input:");
    println!("  Locators: {}", report.locators_total);
    if report.duplicate_locators > 0 {
        println!("  Duplicate URLs dropped: {}", report.duplicate_locators);
    }
    println!("  Already checkpointed: {}", report.skipped_prior);
    println!("  Prior records: {}", report.prior_records);
    println!();

    println!(
        "Batches: {} / {} completed",
        report.batches_completed, report.batches_planned
    );
    println!("Attempted: {}", report.attempted);
    println!("Extracted: {}", report.extracted);
    println!("Failed: {}", report.failed());

    let failures: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(outcome, _)| !outcome.is_success())
        .collect();
    if !failures.is_empty() {
        println!("\nFailures by Outcome:");
        for (outcome, count) in failures {
            println!("  {}: {}", outcome, count);
        }
    }

    println!("\nTotal records: {}", report.total_records);
    if let Some(seconds) = report.duration_seconds() {
        println!("Duration: {}s", seconds);
    }
    if report.cancelled {
        println!("\nRun was stopped early; re-run to resume from the checkpoint.");
    }
}
