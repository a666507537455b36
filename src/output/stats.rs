//! Crawl statistics
//!
//! This module provides the counters the coordinator keeps while it drains
//! the frontier and the end-of-run summary built from them.

use std::fmt;
use std::time::Duration;

/// Counters accumulated over one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Entries popped and marked visited
    pub visited: u64,

    /// Documents written to the output root
    pub archived: u64,

    /// Fetched pages crawled for links only
    pub navigation: u64,

    /// Archived pages whose content container was missing
    pub extraction_fallbacks: u64,

    /// Entries skipped because the fetch failed
    pub fetch_failures: u64,

    /// Content pages that could not be written
    pub persist_failures: u64,

    /// Entries consumed without processing because they exceed max depth
    pub depth_skipped: u64,

    /// Discovered links that entered the frontier
    pub links_enqueued: u64,

    pub checkpoints_written: u64,
    pub checkpoint_failures: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries that were fetched successfully
    pub fn fetched(&self) -> u64 {
        self.archived + self.navigation + self.persist_failures
    }

    /// Returns the fetch success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.fetched() + self.fetch_failures;
        if attempted == 0 {
            return 0.0;
        }
        (self.fetched() as f64 / attempted as f64) * 100.0
    }

    /// Logs the end-of-run summary
    pub fn log_summary(&self, elapsed: Duration) {
        tracing::info!("=== Crawl Statistics ===");
        tracing::info!("  Entries visited: {}", self.visited);
        tracing::info!("  Documents archived: {}", self.archived);
        tracing::info!("  Navigation pages: {}", self.navigation);
        tracing::info!("  Extraction fallbacks: {}", self.extraction_fallbacks);
        tracing::info!("  Fetch failures: {}", self.fetch_failures);
        tracing::info!("  Persistence failures: {}", self.persist_failures);
        tracing::info!("  Depth skips: {}", self.depth_skipped);
        tracing::info!("  Links enqueued: {}", self.links_enqueued);
        tracing::info!(
            "  Checkpoints: {} written, {} failed",
            self.checkpoints_written,
            self.checkpoint_failures
        );
        tracing::info!(
            "  Success rate: {:.1}% in {:?}",
            self.success_rate(),
            elapsed
        );
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visited, {} archived, {} navigation, {} failed",
            self.visited,
            self.archived,
            self.navigation,
            self.fetch_failures + self.persist_failures
        )
    }
}
