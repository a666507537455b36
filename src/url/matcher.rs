use std::fmt;

/// A host pattern from a source profile
///
/// Two forms are accepted:
/// 1. Exact: `"planalto.gov.br"` matches only that host
/// 2. Wildcard: `"*.in.gov.br"` matches the bare domain and any subdomain
///    (`in.gov.br`, `www.in.gov.br`, `pesquisa.in.gov.br`)
///
/// Matching is case-insensitive; the pattern is lowercased once on construction.
///
/// # Examples
///
/// ```
/// use lex_archiver::url::HostPattern;
///
/// let pattern = HostPattern::new("*.in.gov.br");
/// assert!(pattern.matches("www.in.gov.br"));
/// assert!(pattern.matches("IN.GOV.BR"));
/// assert!(!pattern.matches("planalto.gov.br"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    Exact(String),
    Wildcard(String),
}

impl HostPattern {
    /// Parses a configured pattern
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.to_lowercase();
        match pattern.strip_prefix("*.") {
            Some(base) => Self::Wildcard(base.to_string()),
            None => Self::Exact(pattern),
        }
    }

    /// Checks a host against the pattern
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        match self {
            Self::Exact(expected) => host == *expected,
            Self::Wildcard(base) => {
                host == *base
                    || (host.len() > base.len()
                        && host.ends_with(base.as_str())
                        && host.as_bytes()[host.len() - base.len() - 1] == b'.')
            }
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(host) => write!(f, "{}", host),
            Self::Wildcard(base) => write!(f, "*.{}", base),
        }
    }
}
