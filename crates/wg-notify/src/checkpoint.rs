//! Persisted resumption checkpoint.
//!
//! The checkpoint file holds the decimal id of the last event that reached a
//! terminal disposition. A missing file means there is no checkpoint yet.

use std::io;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::datatracker::EventId;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("cannot open {path} for reading: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("last seen file {path} does not contain an integer ({content:?}): {source}")]
    Parse {
        path: PathBuf,
        content: String,
        #[source]
        source: ParseIntError,
    },

    #[error("cannot open {path} for writing: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the checkpoint lives between runs.
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    path: Option<PathBuf>,
}

impl CheckpointStore {
    /// A store backed by `path`, or a memory-only store when `None`.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Starting checkpoint for a run.
    ///
    /// An explicit override wins and the file is not read at all.
    pub fn load(&self, override_id: Option<EventId>) -> Result<Option<EventId>, CheckpointError> {
        if let Some(id) = override_id {
            debug!(id, "Using checkpoint override");
            return Ok(Some(id));
        }

        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No checkpoint file yet");
                return Ok(None);
            }
            Err(source) => {
                return Err(CheckpointError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let id = content
            .trim()
            .parse::<EventId>()
            .map_err(|source| CheckpointError::Parse {
                path: path.to_path_buf(),
                content: content.clone(),
                source,
            })?;
        debug!(id, path = %path.display(), "Loaded checkpoint");
        Ok(Some(id))
    }

    /// Persist the checkpoint reached by a run.
    ///
    /// Returns whether anything was written: nothing is written without a
    /// file or without a checkpoint.
    pub fn save(&self, checkpoint: Option<EventId>) -> Result<bool, CheckpointError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        let Some(id) = checkpoint else {
            info!(path = %path.display(), "No checkpoint to write");
            return Ok(false);
        };

        let write_err = |source| CheckpointError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, id.to_string()).map_err(write_err)?;

        debug!(id, path = %path.display(), "Saved checkpoint");
        Ok(true)
    }
}
