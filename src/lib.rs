//! Lex-Archiver: a resumable, polite crawler for statutory documents
//!
//! This crate walks the link graph of a small set of government sources,
//! archives the pages that hold legal text, and checkpoints its frontier so
//! an interrupted crawl picks up exactly where it stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod policy;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Lex-Archiver operations
#[derive(Debug, Error)]
pub enum LexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Reasons a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failures, timeouts or retryable statuses outlived the attempt budget
    #[error("{url}: gave up after {attempts} attempts ({reason})")]
    Transient {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Malformed URL, redirect loop, or any other failure retrying cannot fix
    #[error("{url}: {reason}")]
    Fatal { url: String, reason: String },

    /// The server answered with a status that is neither success nor retryable
    #[error("{url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Returns true if the failure came from exhausting retries
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// The URL the failure refers to
    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Fatal { url, .. } | Self::Status { url, .. } => url,
        }
    }
}

/// Result type alias for Lex-Archiver operations
pub type Result<T> = std::result::Result<T, LexError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, Frontier, FrontierEntry};
pub use policy::{SourceProfile, UrlPolicy};
pub use state::CrawlPhase;
pub use url::normalize_url;
