//! Headless-browser fallback for script-rendered pages
//!
//! Pages whose content only appears after client-side scripts run are
//! rendered by a headless Chromium (`--dump-dom`) instead of being fetched
//! over plain HTTP. Renders are far more expensive than requests, so they are
//! bounded by their own semaphore and their own timeout, separate from the
//! crawl's concurrency limit.

use super::fetcher::{FetchFailure, FetchOutcome, Fetcher, HttpFetcher, RetryPolicy, SkipReason};
use crate::config::{Config, DynamicConfig};
use crate::url::{extract_domain, is_media_resource, matches_wildcard};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info};
use url::Url;

const BROWSER_ARGS: &[&str] = &["--headless=new", "--disable-gpu", "--no-sandbox", "--dump-dom"];

/// Fetches pages by rendering them in a headless browser process
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    browser_path: String,
    renders: Arc<Semaphore>,
    render_timeout: Duration,
    retry: RetryPolicy,
}

impl BrowserFetcher {
    pub fn new(config: &DynamicConfig, retry: RetryPolicy) -> Self {
        Self {
            browser_path: config.browser_path.clone(),
            renders: Arc::new(Semaphore::new(config.max_concurrent_renders.max(1) as usize)),
            render_timeout: config.render_timeout(),
            retry,
        }
    }

    /// Runs one browser process and returns the serialized DOM
    ///
    /// The process is killed if it outlives the render timeout.
    async fn render(&self, url: &Url) -> Result<String, FetchFailure> {
        let _permit = self
            .renders
            .acquire()
            .await
            .map_err(|_| FetchFailure::Render("render pool closed".to_string()))?;

        debug!(url = %url, browser = %self.browser_path, "Rendering page");

        let child = Command::new(&self.browser_path)
            .args(BROWSER_ARGS)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FetchFailure::Render(format!("failed to launch {}: {}", self.browser_path, e))
            })?;

        let output = match tokio::time::timeout(self.render_timeout, child.wait_with_output()).await
        {
            Ok(result) => result.map_err(|e| FetchFailure::Io(e.to_string()))?,
            Err(_) => return Err(FetchFailure::Timeout),
        };

        if !output.status.success() {
            return Err(FetchFailure::Render(format!(
                "browser exited with {}",
                output.status
            )));
        }

        let dom = String::from_utf8_lossy(&output.stdout).into_owned();
        if dom.trim().is_empty() {
            return Err(FetchFailure::Render("browser produced no DOM".to_string()));
        }
        Ok(dom)
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        if is_media_resource(url.as_str()) {
            return FetchOutcome::Skipped(SkipReason::MediaResource);
        }

        match self.retry.run(url, || self.render(url)).await {
            Ok(body) => FetchOutcome::Success {
                final_url: url.clone(),
                body,
            },
            Err(failure) => FetchOutcome::Failed(failure),
        }
    }
}

/// Decides whether a URL needs a browser render
#[derive(Debug, Clone, Default)]
pub struct DynamicPageDetector {
    url_markers: Vec<String>,
    host_patterns: Vec<String>,
}

impl DynamicPageDetector {
    pub fn new(config: &DynamicConfig) -> Self {
        Self {
            url_markers: config
                .url_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            host_patterns: config
                .host_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// True if the URL contains one of the markers or its host matches one of
    /// the host patterns
    pub fn is_dynamic(&self, url: &Url) -> bool {
        let lowered = url.as_str().to_lowercase();
        if self
            .url_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
        {
            return true;
        }

        match extract_domain(url) {
            Some(host) => self
                .host_patterns
                .iter()
                .any(|pattern| matches_wildcard(pattern, &host)),
            None => false,
        }
    }
}

/// Production fetcher: plain HTTP, with script-rendered pages routed to the
/// browser when the fallback is enabled
#[derive(Debug, Clone)]
pub struct StrategyFetcher {
    http: HttpFetcher,
    browser: Option<BrowserFetcher>,
    detector: DynamicPageDetector,
}

impl StrategyFetcher {
    pub fn new(
        http: HttpFetcher,
        browser: Option<BrowserFetcher>,
        detector: DynamicPageDetector,
    ) -> Self {
        Self {
            http,
            browser,
            detector,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = HttpFetcher::from_config(&config.crawler, &config.user_agent)?;
        let browser = if config.dynamic.enabled {
            info!(
                browser = %config.dynamic.browser_path,
                max_renders = config.dynamic.max_concurrent_renders,
                "Browser rendering enabled"
            );
            Some(BrowserFetcher::new(
                &config.dynamic,
                RetryPolicy::from_config(&config.crawler),
            ))
        } else {
            None
        };

        Ok(Self::new(
            http,
            browser,
            DynamicPageDetector::new(&config.dynamic),
        ))
    }
}

impl Fetcher for StrategyFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        if is_media_resource(url.as_str()) {
            return FetchOutcome::Skipped(SkipReason::MediaResource);
        }

        match &self.browser {
            Some(browser) if self.detector.is_dynamic(url) => browser.fetch(url).await,
            _ => self.http.fetch(url).await,
        }
    }
}
