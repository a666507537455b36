//! Document sink traits and error types
//!
//! This module defines the trait interface for the destinations archived
//! documents are written to, and the associated error types.

use crate::output::Document;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot derive a file name from {0}")]
    InvalidName(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for document sinks
///
/// A sink persists each archived document exactly once. Writing two
/// documents that map to the same name replaces the earlier one.
pub trait DocumentSink {
    /// Persists a document
    ///
    /// # Returns
    ///
    /// The location the document was written to
    fn write(&self, document: &Document) -> OutputResult<PathBuf>;
}
