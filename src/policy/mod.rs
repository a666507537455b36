//! URL policy: which links enter the frontier and which pages are archived
//!
//! Both decisions are pure functions of the URL and the configured source
//! profiles. `is_valid` gates link discovery; `is_content` gates archiving.
//! Navigation pages therefore pass `is_valid` and get crawled for their
//! links even though `is_content` rejects them.

mod profile;

pub use profile::{ContainerSelector, ContentRule, EncodingPolicy, SourceProfile};

use crate::config::Config;
use crate::url::path_extension;
use crate::ConfigError;
use url::Url;

/// The set of source profiles plus the rules shared by all of them
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    profiles: Vec<SourceProfile>,
    blocked_extensions: Vec<String>,
}

impl UrlPolicy {
    /// Creates a policy from already-built profiles
    pub fn new(profiles: Vec<SourceProfile>, blocked_extensions: &[String]) -> Self {
        Self {
            profiles,
            blocked_extensions: blocked_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        }
    }

    /// Builds the policy described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let profiles = config
            .sources
            .iter()
            .map(SourceProfile::from_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(profiles, &config.policy.blocked_extensions))
    }

    /// Returns the first profile the URL belongs to
    pub fn profile_for(&self, url: &Url) -> Option<&SourceProfile> {
        self.profiles.iter().find(|profile| profile.matches(url))
    }

    /// Decides whether a discovered URL may enter the frontier
    ///
    /// # Rules
    ///
    /// - `mailto:` links are rejected
    /// - Only `http`/`https` URLs are accepted
    /// - Blocked extensions (documents, archives, images) are rejected
    /// - The URL must belong to a configured source; unmatched hosts are
    ///   excluded by default
    pub fn is_valid(&self, url: &str) -> bool {
        if url.to_ascii_lowercase().contains("mailto:") {
            return false;
        }

        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return false,
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }

        if let Some(ext) = path_extension(&parsed) {
            if self.blocked_extensions.contains(&ext) {
                return false;
            }
        }

        self.profile_for(&parsed).is_some()
    }

    /// Decides whether a visited page should be archived
    pub fn is_content(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return false,
        };

        self.profile_for(&parsed)
            .is_some_and(|profile| profile.is_content(&parsed))
    }
}
