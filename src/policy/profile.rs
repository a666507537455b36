//! Per-source configuration values
//!
//! A `SourceProfile` bundles everything that differs between crawl targets:
//! how their URLs are recognized, which pages are content, where the legal
//! text lives in the markup, and how mislabeled code pages are handled.

use crate::config::{ContentRuleEntry, FilenameStyle, SourceEntry};
use crate::url::{last_segment, HostPattern};
use crate::ConfigError;
use encoding_rs::{Encoding, UTF_8};
use scraper::Selector;
use url::Url;

/// Static classification and extraction policy for one source
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub name: String,
    pub hosts: Vec<HostPattern>,
    pub path_markers: Vec<String>,
    pub content: ContentRule,
    pub selectors: Vec<ContainerSelector>,
    pub encoding: EncodingPolicy,
    pub filename: FilenameStyle,
}

/// A parsed content-container selector along with its source text
#[derive(Debug, Clone)]
pub struct ContainerSelector {
    pub text: String,
    pub selector: Selector,
}

/// Decides whether a page of a source is worth archiving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRule {
    /// The final path segment carries a document extension
    Filename {
        extensions: Vec<String>,
        ignore: Vec<String>,
    },
    /// The path carries a regulatory-instrument keyword
    Keyword {
        keywords: Vec<String>,
        ignore: Vec<String>,
    },
}

/// How a fetched body is turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Trust the charset reported by the server, UTF-8 when absent
    Transport,
    /// Use the given code page unless the server reports UTF-8
    Fallback(&'static Encoding),
}

impl SourceProfile {
    /// Builds a runtime profile from its configuration entry
    pub fn from_entry(entry: &SourceEntry) -> Result<Self, ConfigError> {
        let selectors = entry
            .selectors
            .iter()
            .map(|text| {
                Selector::parse(text)
                    .map(|selector| ContainerSelector {
                        text: text.clone(),
                        selector,
                    })
                    .map_err(|e| {
                        ConfigError::Validation(format!(
                            "source '{}' has invalid selector '{}': {:?}",
                            entry.name, text, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let encoding = match &entry.fallback_encoding {
            Some(label) => {
                let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "source '{}' has unknown encoding '{}'",
                        entry.name, label
                    ))
                })?;
                EncodingPolicy::Fallback(encoding)
            }
            None => EncodingPolicy::Transport,
        };

        Ok(Self {
            name: entry.name.clone(),
            hosts: entry.hosts.iter().map(|h| HostPattern::new(h)).collect(),
            path_markers: entry.path_markers.clone(),
            content: ContentRule::from(&entry.content),
            selectors,
            encoding,
            filename: entry.filename,
        })
    }

    /// Returns true if the URL belongs to this source
    ///
    /// A URL belongs to a source when its host matches one of the host
    /// patterns or its path contains one of the path markers.
    pub fn matches(&self, url: &Url) -> bool {
        let host_match = url
            .host_str()
            .is_some_and(|host| self.hosts.iter().any(|p| p.matches(host)));

        host_match
            || self
                .path_markers
                .iter()
                .any(|marker| url.path().contains(marker.as_str()))
    }

    /// Returns true if the page at `url` should be archived
    pub fn is_content(&self, url: &Url) -> bool {
        self.content.is_content(url)
    }
}

impl From<&ContentRuleEntry> for ContentRule {
    fn from(entry: &ContentRuleEntry) -> Self {
        let lower = |terms: &[String]| -> Vec<String> {
            terms.iter().map(|t| t.to_lowercase()).collect()
        };
        match entry {
            ContentRuleEntry::Filename { extensions, ignore } => Self::Filename {
                extensions: lower(extensions),
                ignore: lower(ignore),
            },
            ContentRuleEntry::Keyword { keywords, ignore } => Self::Keyword {
                keywords: lower(keywords),
                ignore: lower(ignore),
            },
        }
    }
}

impl ContentRule {
    /// Applies the rule to a URL's final segment, query and path
    pub fn is_content(&self, url: &Url) -> bool {
        let filename = last_segment(url);
        let query = url.query().unwrap_or("").to_lowercase();
        let ignored = |ignore: &[String]| {
            ignore
                .iter()
                .any(|term| filename.contains(term.as_str()) || query.contains(term.as_str()))
        };

        match self {
            Self::Filename { extensions, ignore } => {
                !ignored(ignore)
                    && extensions
                        .iter()
                        .any(|ext| filename.ends_with(ext.as_str()))
            }
            Self::Keyword { keywords, ignore } => {
                let path = url.path().to_lowercase();
                !ignored(ignore) && keywords.iter().any(|kw| path.contains(kw.as_str()))
            }
        }
    }
}

impl EncodingPolicy {
    /// Picks the decoder for a body given the charset the server reported
    pub fn resolve(&self, hint: Option<&str>) -> &'static Encoding {
        let detected = hint.and_then(|label| Encoding::for_label(label.trim().as_bytes()));
        match self {
            Self::Transport => detected.unwrap_or(UTF_8),
            Self::Fallback(fallback) => match detected {
                Some(encoding) if encoding == UTF_8 => UTF_8,
                _ => *fallback,
            },
        }
    }

    /// Decodes a body to text, replacing malformed sequences
    pub fn decode(&self, hint: Option<&str>, body: &[u8]) -> String {
        let encoding = self.resolve(hint);
        let (text, actual, had_errors) = encoding.decode(body);
        if had_errors {
            tracing::debug!("Malformed {} sequences replaced while decoding", actual.name());
        }
        text.into_owned()
    }
}
