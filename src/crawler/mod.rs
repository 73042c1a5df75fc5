//! Crawler module for page discovery, fetching and content extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff, plus a headless-browser fallback
//! - Reduction of pages to heading sections and labeled entities
//! - The per-job frontier that admits each page once
//! - Bounded-concurrency scheduling of work units
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod job;
mod patterns;
mod scheduler;

pub use browser::{BrowserFetcher, DynamicPageDetector, StrategyFetcher};
pub use coordinator::{crawl_blocking, run_blocking, Crawler};
pub use extractor::{resolve_link, ContentExtractor, Extraction};
pub use fetcher::{
    build_http_client, FetchFailure, FetchOutcome, Fetcher, HttpFetcher, RetryPolicy, SkipReason,
};
pub use frontier::Frontier;
pub use job::{CompletionTracker, ContentSet, CrawlJob, CrawlReport, UnitGuard};
pub use patterns::{categorize_link, find_emails, find_phone_numbers};
pub use scheduler::CrawlScheduler;
