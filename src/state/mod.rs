//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's lifecycle (init, running, checkpointing, drained, interrupted)

mod phase;

pub use phase::CrawlPhase;
