//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::model::DetailRecord;
use crate::storage::CheckpointTarget;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backends
///
/// `load` returns the prior results used for dedup; a missing checkpoint is an
/// empty result set, not an error. `persist` replaces the target as a whole:
/// readers never see a partially written checkpoint.
pub trait CheckpointStore: Send + Sync {
    /// Loads the prior checkpoint
    fn load(&self) -> StorageResult<Vec<DetailRecord>>;

    /// Overwrites `target` with `records`
    fn persist(&self, records: &[DetailRecord], target: CheckpointTarget) -> StorageResult<()>;
}
