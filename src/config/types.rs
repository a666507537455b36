use serde::Deserialize;

/// Main configuration structure for Lex-Archiver
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default = "default_sources", rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Starting URLs, crawled in list order at depth 0
    pub seeds: Vec<String>,

    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Fixed wait after each processed entry (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Number of processed entries between checkpoint writes
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,

    /// Timeout for a single request attempt (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Retry and backoff discipline for transient fetch failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles per attempt
    #[serde(rename = "base-delay", default = "default_base_delay")]
    pub base_delay: u64,

    /// Upper bound on a single backoff delay (milliseconds)
    #[serde(rename = "max-delay", default = "default_max_delay")]
    pub max_delay: u64,

    /// Server statuses that are retried
    #[serde(default = "default_retry_statuses")]
    pub statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            statuses: default_retry_statuses(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory archived documents are written to
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Path of the checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,
}

/// Link eligibility rules shared by every source
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// File extensions (with leading dot) that are never enqueued
    #[serde(rename = "blocked-extensions", default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            blocked_extensions: default_blocked_extensions(),
        }
    }
}

/// One crawl source: how its URLs are recognized, classified and extracted
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Short identifier used in logs
    pub name: String,

    /// Host patterns (e.g., "example.gov" or "*.example.gov")
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Path substrings that identify the source regardless of host
    #[serde(rename = "path-markers", default)]
    pub path_markers: Vec<String>,

    /// CSS selectors for the content container, tried in order
    #[serde(default)]
    pub selectors: Vec<String>,

    /// Code page used when the transport does not report UTF-8
    #[serde(rename = "fallback-encoding", default)]
    pub fallback_encoding: Option<String>,

    /// How archived documents are named
    #[serde(default)]
    pub filename: FilenameStyle,

    /// Which pages of this source count as content
    pub content: ContentRuleEntry,
}

/// Content classification rule for a source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ContentRuleEntry {
    /// Final path segment must end with one of the extensions
    Filename {
        extensions: Vec<String>,
        #[serde(default)]
        ignore: Vec<String>,
    },
    /// Path must contain one of the keywords
    Keyword {
        keywords: Vec<String>,
        #[serde(default)]
        ignore: Vec<String>,
    },
}

/// Document naming strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilenameStyle {
    /// `<parent>_<file>` from the last two path segments
    #[default]
    LastTwoSegments,
    /// The last path segment only
    LastSegment,
}

fn default_max_depth() -> u32 {
    3
}

fn default_politeness_delay() -> u64 {
    500
}

fn default_checkpoint_interval() -> u32 {
    50
}

fn default_request_timeout() -> u64 {
    20
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_retry_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

fn default_blocked_extensions() -> Vec<String> {
    [
        ".pdf", ".doc", ".docx", ".odt", ".rtf", ".xls", ".xlsx", ".ppt", ".zip", ".rar", ".7z",
        ".gz", ".img", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".mp3", ".mp4",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

/// Built-in sources used when the configuration names none
pub fn default_sources() -> Vec<SourceEntry> {
    vec![SourceEntry::planalto(), SourceEntry::dou()]
}

impl SourceEntry {
    /// Planalto federal legislation (`/ccivil_03/` tree)
    pub fn planalto() -> Self {
        Self {
            name: "planalto".to_string(),
            hosts: vec![],
            path_markers: vec!["ccivil_03".to_string()],
            selectors: vec![],
            fallback_encoding: Some("windows-1252".to_string()),
            filename: FilenameStyle::LastTwoSegments,
            content: ContentRuleEntry::Filename {
                extensions: vec![".htm".to_string(), ".html".to_string()],
                ignore: ["quadro", "index", "default", "menu"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        }
    }

    /// Diário Oficial da União publications (`in.gov.br`)
    pub fn dou() -> Self {
        Self {
            name: "dou".to_string(),
            hosts: vec!["*.in.gov.br".to_string()],
            path_markers: vec![],
            selectors: vec!["div.texto-dou".to_string(), "div#materia".to_string()],
            fallback_encoding: None,
            filename: FilenameStyle::LastSegment,
            content: ContentRuleEntry::Keyword {
                keywords: [
                    "resolucao",
                    "portaria",
                    "decreto",
                    "instrucao-normativa",
                    "deliberacao",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                ignore: ["busca", "search", "login", "imprimir", "print", "index"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        }
    }
}
