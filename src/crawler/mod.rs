//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and exponential backoff
//! - The FIFO frontier with visited-set deduplication
//! - HTML parsing and link extraction
//! - Content extraction for archived pages
//! - Overall crawl coordination

mod backoff;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod parser;

pub use backoff::ExponentialBackoff;
pub use coordinator::{Coordinator, CrawlReport};
pub use extractor::{extract, extract_with_profile, provenance_header, Extraction, ExtractionOutcome};
pub use fetcher::{build_http_client, charset_from_content_type, FetchedPage, RetryingFetcher};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::parse_links;
