//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::storage::CheckpointState;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint is corrupt: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Failed to replace checkpoint: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StorageError {
    /// Returns true if the stored state exists but cannot be read back
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backend implementations
///
/// A backend holds exactly one snapshot. `save` replaces it atomically:
/// after a crash mid-write, `load` returns either the previous snapshot
/// or the new one, never a partial file.
pub trait CheckpointStore {
    /// Reads the stored snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(Some(state))` - A snapshot was found
    /// * `Ok(None)` - No snapshot has been written yet
    /// * `Err(StorageError::Corrupt)` - A snapshot exists but is malformed
    fn load(&self) -> StorageResult<Option<CheckpointState>>;

    /// Replaces the stored snapshot
    fn save(&self, state: &CheckpointState) -> StorageResult<()>;
}
