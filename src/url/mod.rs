//! URL handling module for Lex-Archiver
//!
//! This module provides URL normalization, host pattern matching and the
//! small path helpers the policy and output layers share.

mod matcher;
mod normalize;

pub use matcher::HostPattern;
pub use normalize::normalize_url;

use url::Url;

/// Returns the non-empty segments of a URL path, in order
pub fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Returns the last path segment, lowercased (empty for a bare host)
pub fn last_segment(url: &Url) -> String {
    path_segments(url)
        .last()
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// Returns the lowercase extension of the last path segment, with its dot
///
/// ```
/// use url::Url;
/// use lex_archiver::url::path_extension;
///
/// let url = Url::parse("https://example.gov/other/X.PDF").unwrap();
/// assert_eq!(path_extension(&url), Some(".pdf".to_string()));
/// ```
pub fn path_extension(url: &Url) -> Option<String> {
    let last = last_segment(url);
    let dot = last.rfind('.')?;
    if dot == 0 || dot == last.len() - 1 {
        return None;
    }
    Some(last[dot..].to_string())
}
