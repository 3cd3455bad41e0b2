//! Output module for run reports and checkpoint statistics
//!
//! This module handles:
//! - Summarizing a finished run
//! - Computing statistics over a checkpoint file

pub mod report;
pub mod stats;

pub use report::{print_report, RunReport};
pub use stats::{load_statistics, print_statistics, CheckpointStatistics};
