//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent and headers
//! - Bounded retries with exponential backoff on transient failures
//! - Error classification into transient, fatal and status failures
//! - Reporting the transport charset so callers can override it

use crate::config::{CrawlerConfig, RetryConfig, UserAgentConfig};
use crate::crawler::backoff::ExponentialBackoff;
use crate::policy::EncodingPolicy;
use crate::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A page as returned by the server
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Charset from the Content-Type header, if any
    pub encoding_hint: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Turns a non-success status into a [`FetchError::Status`]
    pub fn ensure_success(self, url: &str) -> Result<Self, FetchError> {
        if (200..300).contains(&self.status) {
            Ok(self)
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }

    /// Decodes the body according to a source's encoding policy
    pub fn text(&self, policy: EncodingPolicy) -> String {
        policy.decode(self.encoding_hint.as_deref(), &self.body)
    }
}

/// Outcome of a single attempt inside the retry loop
enum Attempt {
    Done(FetchedPage),
    Retry(String),
    Fatal(String),
}

/// HTTP GET with bounded retries and exponential backoff
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Connection refused/reset | Retry with backoff |
/// | Request timeout | Retry with backoff |
/// | Configured 5xx status | Retry with backoff |
/// | Any other status | Returned to the caller |
/// | Malformed URL, redirect loop | Immediate fatal error |
///
/// When the attempt budget runs out the last failure surfaces as
/// [`FetchError::Transient`].
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    max_attempts: u32,
    retry_statuses: Vec<u16>,
    backoff: ExponentialBackoff,
}

impl RetryingFetcher {
    /// Wraps an existing client
    pub fn new(client: Client, retry: &RetryConfig) -> Self {
        Self {
            client,
            max_attempts: retry.max_attempts.max(1),
            retry_statuses: retry.statuses.clone(),
            backoff: ExponentialBackoff::from(retry),
        }
    }

    /// Builds the client from configuration and wraps it
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
        retry: &RetryConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(crawler.request_timeout))?;
        Ok(Self::new(client, retry))
    }

    /// Fetches a URL, retrying transient failures
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Fatal {
            url: url.to_string(),
            reason: format!("malformed URL: {}", e),
        })?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let reason = match self.attempt(&parsed).await {
                Attempt::Done(page) => return Ok(page),
                Attempt::Fatal(reason) => {
                    return Err(FetchError::Fatal {
                        url: url.to_string(),
                        reason,
                    })
                }
                Attempt::Retry(reason) => reason,
            };

            if attempt >= self.max_attempts {
                return Err(FetchError::Transient {
                    url: url.to_string(),
                    attempts: attempt,
                    reason,
                });
            }

            let delay = self.backoff.delay(attempt - 1);
            tracing::debug!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                self.max_attempts,
                url,
                reason,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        if self.is_retryable(status) {
            return Attempt::Retry(format!("HTTP {}", status.as_u16()));
        }

        match read_page(response).await {
            Ok(page) => Attempt::Done(page),
            Err(e) => classify_error(&e),
        }
    }

    fn is_retryable(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }
}

/// Builds an HTTP client with the crawler's identity and timeouts
///
/// # Example
///
/// ```no_run
/// use lex_archiver::config::UserAgentConfig;
/// use lex_archiver::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "LexArchiver".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    request_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pt-BR,pt;q=0.9,en;q=0.5"));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .build()
}

async fn read_page(response: Response) -> Result<FetchedPage, reqwest::Error> {
    let final_url = response.url().clone();
    let status = response.status().as_u16();
    let encoding_hint = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_from_content_type);
    let body = response.bytes().await?.to_vec();

    Ok(FetchedPage {
        final_url,
        status,
        encoding_hint,
        body,
    })
}

fn classify_error(e: &reqwest::Error) -> Attempt {
    if e.is_timeout() {
        Attempt::Retry("request timeout".to_string())
    } else if e.is_connect() {
        Attempt::Retry(format!("connection failed: {}", e))
    } else if e.is_redirect() {
        Attempt::Fatal(format!("redirect error: {}", e))
    } else if e.is_body() || e.is_request() {
        // Resets while sending or reading the body
        Attempt::Retry(e.to_string())
    } else {
        Attempt::Fatal(e.to_string())
    }
}

/// Extracts the `charset` parameter of a Content-Type value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"').trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
