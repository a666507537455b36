//! Storage module for persisting crawl state
//!
//! This module handles checkpointing of the frontier, including:
//! - The serializable snapshot of the queue and visited set
//! - Atomic replacement of the checkpoint file
//! - Detection of corrupt checkpoints at load time

mod checkpoint;
mod traits;

pub use checkpoint::{CheckpointState, JsonCheckpointStore};
pub use traits::{CheckpointStore, StorageError, StorageResult};
