//! Storage module for checkpoints and input files
//!
//! This module handles:
//! - Loading the locator list produced by the listing crawl
//! - Loading the prior checkpoint used for dedup
//! - Atomically persisting the cumulative result collection

mod json;
mod traits;

pub use json::{load_locators, load_records, JsonCheckpointStore};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use std::fmt;

/// Which output a checkpoint write goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointTarget {
    /// Rewritten after every batch
    Partial,

    /// Written once when the run finishes
    Final,
}

impl fmt::Display for CheckpointTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Partial => write!(f, "partial"),
            Self::Final => write!(f, "final"),
        }
    }
}
