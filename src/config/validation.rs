use crate::config::types::{
    Config, ContentRuleEntry, CrawlerConfig, OutputConfig, PolicyConfig, RetryConfig, SourceEntry,
    UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_policy_config(&config.policy)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates the retry discipline
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.base_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "base_delay ({}ms) cannot exceed max_delay ({}ms)",
            config.base_delay, config.max_delay
        )));
    }

    if let Some(status) = config.statuses.iter().find(|s| !(500..=599).contains(*s)) {
        return Err(ConfigError::Validation(format!(
            "only 5xx statuses can be retried, got {}",
            status
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the shared link policy
fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    for ext in &config.blocked_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "blocked extension '{}' must look like '.pdf'",
                ext
            )));
        }
    }
    Ok(())
}

/// Validates every source profile entry
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in sources {
        if source.name.is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        validate_source(source)?;
    }

    Ok(())
}

/// Validates a single source entry
fn validate_source(source: &SourceEntry) -> Result<(), ConfigError> {
    if source.hosts.is_empty() && source.path_markers.is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' needs at least one host pattern or path marker",
            source.name
        )));
    }

    for host in &source.hosts {
        validate_domain_pattern(host)?;
    }

    if source.path_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "source '{}' has an empty path marker",
            source.name
        )));
    }

    for selector in &source.selectors {
        scraper::Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!(
                "source '{}' has invalid selector '{}': {:?}",
                source.name, selector, e
            ))
        })?;
    }

    if let Some(label) = &source.fallback_encoding {
        if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
            return Err(ConfigError::Validation(format!(
                "source '{}' has unknown encoding '{}'",
                source.name, label
            )));
        }
    }

    let (terms, ignore, kind) = match &source.content {
        ContentRuleEntry::Filename { extensions, ignore } => (extensions, ignore, "extension"),
        ContentRuleEntry::Keyword { keywords, ignore } => (keywords, ignore, "keyword"),
    };

    if terms.is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' content rule needs at least one {}",
            source.name, kind
        )));
    }

    // A blank term matches every path
    if terms.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "source '{}' has an empty {}",
            source.name, kind
        )));
    }

    if ignore.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "source '{}' has an empty ignore term",
            source.name
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.gov, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.gov')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
