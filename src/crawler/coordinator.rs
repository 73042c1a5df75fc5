//! Crawler coordinator - entry points for running a crawl
//!
//! This module ties the pieces together:
//! - Validating configuration and the seed URL
//! - Building the production fetcher from configuration
//! - Running one crawl job per call and returning its content
//! - Providing a blocking entry point with its own worker pool

use crate::config::{validate, Config};
use crate::crawler::browser::StrategyFetcher;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::job::CrawlReport;
use crate::crawler::scheduler::CrawlScheduler;
use crate::url::normalize_url;
use crate::SiftError;
use std::time::Duration;
use url::Url;

/// Time given to worker threads to wind down after a blocking crawl
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Main crawler structure
///
/// A `Crawler` can run any number of crawls, one after another or at the
/// same time. Each call gets its own job with its own frontier, content set
/// and concurrency limit.
pub struct Crawler<F: Fetcher = StrategyFetcher> {
    config: Config,
    scheduler: CrawlScheduler<F>,
}

impl Crawler<StrategyFetcher> {
    /// Creates a crawler with the production fetcher
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Configuration is valid and the HTTP client was built
    /// * `Err(SiftError)` - Invalid configuration or unusable HTTP client
    pub fn new(config: Config) -> Result<Self, SiftError> {
        validate(&config)?;
        let fetcher = StrategyFetcher::from_config(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> Crawler<F> {
    /// Creates a crawler around any fetcher
    pub fn with_fetcher(config: Config, fetcher: F) -> Self {
        let scheduler = CrawlScheduler::new(
            fetcher,
            config.crawler.max_depth,
            config.crawler.max_concurrent_pages as usize,
        );
        Self { config, scheduler }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls from `seed` and returns the deduplicated content strings
    ///
    /// Per-page problems never fail the crawl; a seed that cannot be fetched
    /// simply yields an empty list.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sitesift::{Config, Crawler};
    ///
    /// # async fn example() -> sitesift::Result<()> {
    /// let crawler = Crawler::new(Config::default())?;
    /// let contents = crawler.crawl("https://example.com/").await?;
    /// for content in contents {
    ///     println!("{}", content);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&self, seed: &str) -> Result<Vec<String>, SiftError> {
        Ok(self.run(seed).await?.contents)
    }

    /// Crawls from `seed` and returns the full report
    pub async fn run(&self, seed: &str) -> Result<CrawlReport, SiftError> {
        let seed = parse_seed(seed)?;
        tracing::info!("Starting crawl of {}", seed);
        Ok(self.scheduler.run(seed).await)
    }

    /// Like [`Crawler::run`], but stops scheduling new fetches once
    /// `deadline` has passed and returns what was gathered so far
    pub async fn run_with_deadline(
        &self,
        seed: &str,
        deadline: Duration,
    ) -> Result<CrawlReport, SiftError> {
        let seed = parse_seed(seed)?;
        tracing::info!("Starting crawl of {} with a {:?} deadline", seed, deadline);
        Ok(self.scheduler.run_with_deadline(seed, deadline).await)
    }
}

/// Runs one crawl on a dedicated worker pool and blocks until it completes
///
/// The pool has `crawler.worker-threads` threads and is shut down before
/// returning. Called from inside an async runtime it returns
/// [`SiftError::Runtime`]; use [`Crawler::crawl`] there instead.
///
/// # Example
///
/// ```no_run
/// use sitesift::{crawl_blocking, Config};
///
/// let contents = crawl_blocking(Config::default(), "https://example.com/").unwrap();
/// println!("{} content blocks", contents.len());
/// ```
pub fn crawl_blocking(config: Config, seed: &str) -> Result<Vec<String>, SiftError> {
    Ok(run_blocking(config, seed, None)?.contents)
}

/// Blocking variant of [`Crawler::run`] with an optional deadline
pub fn run_blocking(
    config: Config,
    seed: &str,
    deadline: Option<Duration>,
) -> Result<CrawlReport, SiftError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(SiftError::Runtime(
            "blocking crawl started from inside an async runtime".to_string(),
        ));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.crawler.worker_threads.max(1))
        .thread_name("sitesift-worker")
        .enable_all()
        .build()
        .map_err(|e| SiftError::Runtime(format!("Failed to build worker pool: {}", e)))?;

    let crawler = Crawler::new(config)?;
    let report = runtime.block_on(async {
        match deadline {
            Some(deadline) => crawler.run_with_deadline(seed, deadline).await,
            None => crawler.run(seed).await,
        }
    });

    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    report
}

/// Checks that the seed is an absolute http(s) URL with a host
fn parse_seed(seed: &str) -> Result<Url, SiftError> {
    normalize_url(seed).map_err(|e| SiftError::InvalidSeed {
        url: seed.to_string(),
        reason: e.to_string(),
    })?;

    Url::parse(seed.trim()).map_err(|e| SiftError::InvalidSeed {
        url: seed.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchFailure, FetchOutcome};

    /// Serves a fixed page for every URL
    #[derive(Clone)]
    struct StaticFetcher(&'static str);

    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> FetchOutcome {
            if url.path() == "/" {
                FetchOutcome::Success {
                    final_url: url.clone(),
                    body: self.0.to_string(),
                }
            } else {
                FetchOutcome::Failed(FetchFailure::HttpStatus(404))
            }
        }
    }

    #[test]
    fn test_parse_seed() {
        assert!(parse_seed("https://example.com/").is_ok());
        assert!(parse_seed("  https://example.com/about  ").is_ok());
        assert!(matches!(
            parse_seed("ftp://example.com/"),
            Err(SiftError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse_seed("example.com"),
            Err(SiftError::InvalidSeed { .. })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.crawler.max_concurrent_pages = 0;
        assert!(matches!(Crawler::new(config), Err(SiftError::Config(_))));
    }

    #[tokio::test]
    async fn test_crawl_returns_contents() {
        let crawler = Crawler::with_fetcher(
            Config::default(),
            StaticFetcher(r#"<h1>Hello</h1><p>Mail hello@example.com</p>"#),
        );

        let contents = crawler.crawl("https://example.com/").await.unwrap();
        assert!(contents.contains(&"Hello:\nMail hello@example.com".to_string()));
        assert!(contents.contains(&"Email: hello@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_seed_is_an_error() {
        let crawler = Crawler::with_fetcher(Config::default(), StaticFetcher(""));
        assert!(crawler.crawl("javascript:void(0)").await.is_err());
    }

    #[tokio::test]
    async fn test_unfetchable_seed_yields_empty_list() {
        let crawler = Crawler::with_fetcher(Config::default(), StaticFetcher(""));
        let report = crawler.run("https://example.com/gone").await.unwrap();
        assert!(report.contents.is_empty());
        assert_eq!(report.stats.failed, 1);
    }

    #[tokio::test]
    async fn test_crawl_blocking_inside_runtime_is_an_error() {
        let result = crawl_blocking(Config::default(), "https://example.com/");
        assert!(matches!(result, Err(SiftError::Runtime(_))));
    }

    #[test]
    fn test_crawl_blocking_media_seed() {
        let contents = crawl_blocking(Config::default(), "https://example.com/photo.jpg").unwrap();
        assert!(contents.is_empty());
    }
}
