//! JSON-file checkpoint store
//!
//! Checkpoints are pretty-printed UTF-8 JSON arrays of `DetailRecord`.
//! Writes go to a temp file in the target's directory which is then renamed
//! over the target.

use crate::config::PathsConfig;
use crate::model::{DetailRecord, Locator};
use crate::storage::{CheckpointStore, CheckpointTarget, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Checkpoint store backed by JSON files on disk
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    prior_path: Option<PathBuf>,
    partial_path: PathBuf,
    final_path: PathBuf,
}

impl JsonCheckpointStore {
    /// Creates a store that loads prior results from `prior_path`
    pub fn new(
        prior_path: impl Into<PathBuf>,
        partial_path: impl Into<PathBuf>,
        final_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prior_path: Some(prior_path.into()),
            partial_path: partial_path.into(),
            final_path: final_path.into(),
        }
    }

    /// Builds a store from the `[paths]` config section
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(
            paths.prior_path(),
            paths.partial.clone(),
            paths.final_output.clone(),
        )
    }

    /// Ignores any prior checkpoint, so every locator is pending
    pub fn fresh(mut self) -> Self {
        self.prior_path = None;
        self
    }

    /// Resolves a target to its file path
    pub fn target_path(&self, target: CheckpointTarget) -> &Path {
        match target {
            CheckpointTarget::Partial => &self.partial_path,
            CheckpointTarget::Final => &self.final_path,
        }
    }

    /// Creates the parent directories of both output targets
    pub fn ensure_dirs(&self) -> StorageResult<()> {
        for path in [&self.partial_path, &self.final_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> StorageResult<Vec<DetailRecord>> {
        let Some(path) = &self.prior_path else {
            return Ok(Vec::new());
        };

        match read_json_array::<DetailRecord>(path) {
            Ok(records) => {
                tracing::debug!(path = %path.display(), count = records.len(), "Loaded prior checkpoint");
                Ok(records)
            }
            Err(StorageError::InputNotFound(_)) => {
                tracing::info!(path = %path.display(), "No prior checkpoint, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn persist(&self, records: &[DetailRecord], target: CheckpointTarget) -> StorageResult<()> {
        let path = self.target_path(target);
        write_json_atomic(path, records)?;
        tracing::debug!(path = %path.display(), count = records.len(), checkpoint = %target, "Checkpoint saved");
        Ok(())
    }
}

/// Loads the locator list; a missing input file is an error
pub fn load_locators(path: &Path) -> StorageResult<Vec<Locator>> {
    read_json_array(path)
}

/// Loads a checkpoint file; a missing file is an error
pub fn load_records(path: &Path) -> StorageResult<Vec<DetailRecord>> {
    read_json_array(path)
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => StorageError::InputNotFound(path.to_path_buf()),
        _ => StorageError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `records` to a sibling temp file, then renames it over `path`
fn write_json_atomic(path: &Path, records: &[DetailRecord]) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let io_err = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, records).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }
    temp.as_file().sync_all().map_err(io_err)?;

    temp.persist(path).map_err(|e| StorageError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
