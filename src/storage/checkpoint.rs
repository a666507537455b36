//! JSON checkpoint file
//!
//! The file holds `visited` (URL strings) and `queue` (`[url, depth]` pairs).
//! `config_hash` and `saved_at` are optional so checkpoints written without
//! them still load.

use crate::crawler::FrontierEntry;
use crate::storage::{CheckpointStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Serializable snapshot of the frontier and visited set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub visited: Vec<String>,
    pub queue: Vec<FrontierEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl CheckpointState {
    pub fn new(visited: Vec<String>, queue: Vec<FrontierEntry>) -> Self {
        Self {
            visited,
            queue,
            config_hash: None,
            saved_at: None,
        }
    }

    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }
}

/// Checkpoint stored as a single JSON file on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> StorageResult<Option<CheckpointState>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, state: &CheckpointState) -> StorageResult<()> {
        let mut state = state.clone();
        state.saved_at = Some(Utc::now());

        let json =
            serde_json::to_vec(&state).map_err(|e| StorageError::Serialize(e.to_string()))?;

        let dir = self.parent_dir();
        std::fs::create_dir_all(dir)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        tracing::debug!(
            "Checkpoint written to {} ({} visited, {} queued)",
            self.path.display(),
            state.visited.len(),
            state.queue.len()
        );
        Ok(())
    }
}
