//! Work-unit scheduling for one crawl job
//!
//! Every admitted URL becomes a work unit running on its own Tokio task:
//!
//! ```text
//! Queued -> Fetching -> Extracting -> Completed
//!    \
//!     `---> Rejected (skip rule matched or job cancelled)
//! ```
//!
//! A unit holds one of the job's semaphore permits from the start of its
//! fetch to the end of its extraction. It then releases the permit, merges
//! its content into the job, and spawns one child unit per newly admitted
//! link without waiting for any of them. The job is done when its
//! [`CompletionTracker`](super::job::CompletionTracker) reaches zero.

use super::extractor::{ContentExtractor, Extraction};
use super::fetcher::{FetchFailure, FetchOutcome, Fetcher, SkipReason};
use super::job::{CrawlJob, CrawlReport};
use crate::state::UnitState;
use crate::url::{is_media_resource, normalize_url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Redirect hops a unit follows before giving up
const MAX_REDIRECTS: usize = 10;

/// Starts crawl jobs and drives their work units
#[derive(Debug, Clone)]
pub struct CrawlScheduler<F: Fetcher> {
    fetcher: F,
    extractor: Arc<ContentExtractor>,
    max_depth: u32,
    max_concurrent_pages: usize,
}

impl<F: Fetcher> CrawlScheduler<F> {
    pub fn new(fetcher: F, max_depth: u32, max_concurrent_pages: usize) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(ContentExtractor::new()),
            max_depth,
            max_concurrent_pages: max_concurrent_pages.max(1),
        }
    }

    /// Creates a job for `seed` and spawns its root unit
    ///
    /// Must be called from within a Tokio runtime. The returned job can be
    /// awaited with [`CrawlJob::wait`] or [`CrawlJob::wait_with_deadline`].
    pub fn start(&self, seed: Url) -> Arc<CrawlJob> {
        info!(
            seed = %seed,
            max_depth = self.max_depth,
            max_concurrent_pages = self.max_concurrent_pages,
            "Starting crawl job"
        );

        let job = Arc::new(CrawlJob::new(seed, self.max_depth));
        let context = Arc::new(JobContext {
            job: Arc::clone(&job),
            fetcher: self.fetcher.clone(),
            extractor: Arc::clone(&self.extractor),
            permits: Semaphore::new(self.max_concurrent_pages),
        });

        match job.frontier().try_admit(job.seed().as_str()) {
            Some(root) => context.spawn_unit(root, 0),
            None => warn!(seed = %job.seed(), "Seed URL was not admitted"),
        }

        job
    }

    /// Runs a job to completion and returns its report
    pub async fn run(&self, seed: Url) -> CrawlReport {
        let job = self.start(seed);
        job.wait().await;
        job.report()
    }

    /// Runs a job, cancelling whatever has not started by `deadline`
    pub async fn run_with_deadline(&self, seed: Url, deadline: Duration) -> CrawlReport {
        let job = self.start(seed);
        job.wait_with_deadline(deadline).await;
        job.report()
    }
}

/// Everything a unit needs, shared by all units of one job
struct JobContext<F: Fetcher> {
    job: Arc<CrawlJob>,
    fetcher: F,
    extractor: Arc<ContentExtractor>,
    permits: Semaphore,
}

impl<F: Fetcher> JobContext<F> {
    /// Registers a unit with the job and runs it on a new task
    fn spawn_unit(self: &Arc<Self>, url: Url, depth: u32) {
        let guard = self.job.tracker().register();
        self.job.stats().record_admitted();

        let context = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            context.run_unit(url, depth).await;
        });
    }

    async fn run_unit(self: Arc<Self>, url: Url, depth: u32) {
        let job = &self.job;
        let mut state = UnitState::Queued;
        trace!(url = %url, depth, state = %state, "Unit queued");

        if job.is_cancelled() {
            advance(&url, state, UnitState::Rejected);
            job.stats().record_cancelled();
            return;
        }
        if is_media_resource(url.as_str()) {
            debug!(url = %url, depth, "Skipping media resource");
            advance(&url, state, UnitState::Rejected);
            job.stats().record_skipped();
            return;
        }

        let Ok(permit) = self.permits.acquire().await else {
            advance(&url, state, UnitState::Rejected);
            job.stats().record_cancelled();
            return;
        };
        if job.is_cancelled() {
            advance(&url, state, UnitState::Rejected);
            job.stats().record_cancelled();
            return;
        }

        state = advance(&url, state, UnitState::Fetching);
        job.stats().enter_flight();

        let extraction = match self.fetch_following_redirects(&url).await {
            FetchOutcome::Success { final_url, body } => {
                job.stats().record_fetched();
                state = advance(&url, state, UnitState::Extracting);
                Some(self.extractor.extract(&body, &final_url))
            }
            FetchOutcome::Skipped(reason) => {
                debug!(url = %url, reason = %reason, "Fetch skipped");
                None
            }
            FetchOutcome::Redirected(_) => None,
            FetchOutcome::Failed(failure) => {
                warn!(url = %url, depth, error = %failure, "Fetch failed");
                job.stats().record_failed(url.as_str(), failure.to_string());
                None
            }
        };

        job.stats().leave_flight();
        drop(permit);

        if let Some(extraction) = extraction {
            self.absorb(&url, depth, extraction);
        }

        advance(&url, state, UnitState::Completed);
        job.stats().record_completed();
    }

    /// Fetches `url`, following redirects through the frontier
    ///
    /// A hop to a page with the same identity is followed directly. A hop to
    /// a different page is followed only if that page wins admission, so a
    /// redirect target is never requested by two units.
    async fn fetch_following_redirects(&self, url: &Url) -> FetchOutcome {
        let mut current = url.clone();
        for _ in 0..=MAX_REDIRECTS {
            let target = match self.fetcher.fetch(&current).await {
                FetchOutcome::Redirected(target) => target,
                outcome => return outcome,
            };

            if is_media_resource(target.as_str()) {
                debug!(url = %current, target = %target, "Redirect to media resource");
                return FetchOutcome::Skipped(SkipReason::MediaResource);
            }
            if !same_page(&current, &target)
                && self.job.frontier().try_admit(target.as_str()).is_none()
            {
                debug!(url = %current, target = %target, "Redirect target already admitted");
                return FetchOutcome::Skipped(SkipReason::AlreadyAdmitted);
            }

            trace!(url = %current, target = %target, "Following redirect");
            current = target;
        }

        FetchOutcome::Failed(FetchFailure::Request(format!(
            "more than {} redirects",
            MAX_REDIRECTS
        )))
    }

    /// Merges a unit's content into the job and schedules its links
    fn absorb(self: &Arc<Self>, url: &Url, depth: u32, extraction: Extraction) {
        let job = &self.job;
        let added = job.contents().extend(extraction.contents);
        job.stats().record_links(extraction.links.len());

        if depth >= job.max_depth() {
            debug!(url = %url, depth, added, "Depth bound reached, not expanding");
            return;
        }
        if job.is_cancelled() {
            return;
        }

        let mut scheduled = 0;
        for link in &extraction.links {
            if let Some(target) = job.frontier().try_admit(link) {
                self.spawn_unit(target, depth + 1);
                scheduled += 1;
            }
        }

        debug!(
            url = %url,
            depth,
            added,
            links = extraction.links.len(),
            scheduled,
            "Unit expanded"
        );
    }
}

/// Whether two URLs share a frontier identity
fn same_page(a: &Url, b: &Url) -> bool {
    match (normalize_url(a.as_str()), normalize_url(b.as_str())) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Moves a unit to its next state, reporting illegal transitions
fn advance(url: &Url, current: UnitState, next: UnitState) -> UnitState {
    match current.transition(next) {
        Ok(state) => {
            trace!(url = %url, state = %state, "Unit state changed");
            state
        }
        Err(e) => {
            error!(url = %url, error = %e, "Illegal unit transition");
            next
        }
    }
}
