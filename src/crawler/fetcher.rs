//! Page fetching
//!
//! This module handles every network read of the crawler:
//! - the skip rule for media resources, applied before any I/O
//! - building the HTTP client with the identifying user agent
//! - bounded retries with exponential backoff for transient failures
//! - classification of failures into transient and permanent ones
//!
//! A fetch never returns an error; every problem ends up as a
//! [`FetchOutcome`] the caller can absorb.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::is_media_resource;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Result of fetching one URL
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was retrieved
    Success {
        /// URL the body was served from
        final_url: Url,
        body: String,
    },

    /// The server answered with a redirect to this absolute URL
    ///
    /// Redirects are not followed by the fetcher. The caller decides whether
    /// the target still needs fetching.
    Redirected(Url),

    /// The URL was never requested
    Skipped(SkipReason),

    /// Every attempt failed, or a permanent failure ended the attempts early
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Why a URL was not requested at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The path names an image, audio, video or document file
    MediaResource,

    /// A redirect pointed at a page another unit already owns
    AlreadyAdmitted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MediaResource => write!(f, "media resource"),
            SkipReason::AlreadyAdmitted => write!(f, "redirect target already admitted"),
        }
    }
}

/// A failed fetch attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Io(String),

    #[error("request rejected: {0}")]
    Request(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl FetchFailure {
    /// Whether another attempt could plausibly succeed
    ///
    /// | Failure | Transient |
    /// |---------|-----------|
    /// | Timeout, network error | yes |
    /// | HTTP 5xx, 408, 429 | yes |
    /// | other HTTP status | no |
    /// | unsupported content type | no |
    /// | redirect loop, invalid request | no |
    /// | browser could not run | no |
    pub fn is_transient(&self) -> bool {
        match self {
            FetchFailure::Timeout | FetchFailure::Io(_) => true,
            FetchFailure::HttpStatus(status) => *status >= 500 || *status == 408 || *status == 429,
            FetchFailure::UnsupportedContentType(_)
            | FetchFailure::Request(_)
            | FetchFailure::Render(_) => false,
        }
    }
}

/// Something that can retrieve a page
///
/// Implementations hold no mutable state, so clones can be handed to every
/// work unit of a crawl.
pub trait Fetcher: Send + Sync + Clone + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchOutcome> + Send;
}

/// Attempt limit and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.retry_limit.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay after the given failed attempt (1-based): `base × 2^attempt`,
    /// capped at `max_delay`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the attempt
    /// limit is reached, sleeping between attempts
    pub async fn run<T, F, Fut>(&self, url: &Url, mut attempt: F) -> Result<T, FetchFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchFailure>>,
    {
        let mut attempt_number = 1;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(failure) if !failure.is_transient() => {
                    debug!(url = %url, error = %failure, "Permanent fetch failure");
                    return Err(failure);
                }
                Err(failure) if attempt_number >= self.max_attempts => {
                    warn!(
                        url = %url,
                        attempts = attempt_number,
                        error = %failure,
                        "Max retries reached"
                    );
                    return Err(failure);
                }
                Err(failure) => {
                    let delay = self.delay_after(attempt_number);
                    warn!(
                        url = %url,
                        attempt = attempt_number,
                        error = %failure,
                        retry_in_ms = delay.as_millis() as u64,
                        "Fetch attempt failed"
                    );
                    tokio::time::sleep(delay).await;
                    attempt_number += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Builds the HTTP client shared by all fetches of a crawl
///
/// Every request carries the identifying user agent
/// `Name/Version (+ContactURL; ContactEmail)` and the given per-attempt
/// timeout. Redirects are returned to the caller instead of being followed,
/// so every hop goes through the crawl frontier.
///
/// # Example
///
/// ```no_run
/// use sitesift::config::UserAgentConfig;
/// use sitesift::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Builds the client from configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler.request_timeout())?;
        Ok(Self::new(client, RetryPolicy::from_config(crawler)))
    }

    /// One GET request, without retries
    async fn attempt(&self, url: &Url) -> Result<FetchOutcome, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status.is_redirection() {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| url.join(location.trim()).ok());
            return match target {
                Some(target) => Ok(FetchOutcome::Redirected(target)),
                None => Err(FetchFailure::HttpStatus(status.as_u16())),
            };
        }
        if !status.is_success() {
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_textual_content_type(&content_type) {
            return Err(FetchFailure::UnsupportedContentType(content_type));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify_error)?;
        Ok(FetchOutcome::Success { final_url, body })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        if is_media_resource(url.as_str()) {
            debug!(url = %url, "Skipping media resource");
            return FetchOutcome::Skipped(SkipReason::MediaResource);
        }

        match self.retry.run(url, || self.attempt(url)).await {
            Ok(outcome) => outcome,
            Err(failure) => FetchOutcome::Failed(failure),
        }
    }
}

/// Missing content types are accepted, as is anything textual or markup
fn is_textual_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("xml")
}

fn classify_error(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_redirect() || error.is_builder() {
        FetchFailure::Request(error.to_string())
    } else {
        FetchFailure::Io(error.to_string())
    }
}
