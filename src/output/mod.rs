//! Output module for archived documents and crawl statistics
//!
//! This module handles:
//! - Naming archived documents from their URL
//! - Writing documents to the output root
//! - Recording crawl statistics

mod filesystem;
pub mod stats;
mod traits;

pub use filesystem::{Document, FsDocumentSink};
pub use stats::CrawlStats;
pub use traits::{DocumentSink, OutputError, OutputResult};
