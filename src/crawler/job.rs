//! State owned by one crawl job
//!
//! A job is created per crawl call and dropped once its report is taken.
//! Nothing here is shared between jobs.

use super::frontier::Frontier;
use crate::state::{CrawlStats, StatsRecorder};
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{info, warn};
use url::Url;

/// Content strings gathered by all units of a job
///
/// Membership is checked against a concurrent set; accepted strings are
/// also appended to a list so the final content keeps first-seen order.
#[derive(Debug, Default)]
pub struct ContentSet {
    members: DashSet<String>,
    ordered: Mutex<Vec<String>>,
}

impl ContentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string, returning false if an equal string is already present
    pub fn insert(&self, content: String) -> bool {
        if !self.members.insert(content.clone()) {
            return false;
        }
        self.ordered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(content);
        true
    }

    /// Adds every string, returning how many were new
    pub fn extend<I>(&self, contents: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        contents
            .into_iter()
            .filter(|content| self.insert(content.clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Copy of the content in first-seen order
    pub fn to_vec(&self) -> Vec<String> {
        self.ordered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Counts outstanding work units and wakes the job when none are left
///
/// A unit registers its children before it deregisters itself, so the count
/// can only reach zero once: after the last unit of the job has finished.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit; the unit counts as outstanding until the guard drops
    pub fn register(self: &Arc<Self>) -> UnitGuard {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        UnitGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    fn deregister(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_one();
        }
    }

    /// Resolves once no unit is outstanding
    pub async fn wait_idle(&self) {
        loop {
            if self.outstanding() == 0 {
                return;
            }
            // notify_one leaves a permit behind if nobody is waiting yet
            self.idle.notified().await;
        }
    }
}

/// Keeps a unit registered with its [`CompletionTracker`] while alive
///
/// Dropping the guard deregisters the unit, including when the task running
/// it panics or is aborted.
#[derive(Debug)]
pub struct UnitGuard {
    tracker: Arc<CompletionTracker>,
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        self.tracker.deregister();
    }
}

/// Outcome of a finished crawl job
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub seed: String,

    /// Deduplicated content strings in first-seen order
    pub contents: Vec<String>,

    pub stats: CrawlStats,
    pub duration: Duration,

    /// Whether the job hit its deadline before all units ran
    pub cancelled: bool,
}

/// Aggregate state of one crawl
#[derive(Debug)]
pub struct CrawlJob {
    seed: Url,
    max_depth: u32,
    frontier: Frontier,
    contents: ContentSet,
    tracker: Arc<CompletionTracker>,
    stats: StatsRecorder,
    cancelled: AtomicBool,
    started: Instant,
}

impl CrawlJob {
    pub fn new(seed: Url, max_depth: u32) -> Self {
        Self {
            seed,
            max_depth,
            frontier: Frontier::new(),
            contents: ContentSet::new(),
            tracker: Arc::new(CompletionTracker::new()),
            stats: StatsRecorder::new(),
            cancelled: AtomicBool::new(false),
            started: Instant::now(),
        }
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn contents(&self) -> &ContentSet {
        &self.contents
    }

    pub fn tracker(&self) -> &Arc<CompletionTracker> {
        &self.tracker
    }

    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    /// Stops units that have not started fetching from doing so
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Waits until every unit of the job has finished
    pub async fn wait(&self) {
        self.tracker.wait_idle().await;
    }

    /// Waits for the job, cancelling it if `deadline` passes first
    ///
    /// After cancellation, queued units finish without fetching and the call
    /// returns as soon as the in-flight ones drain. Returns false if the
    /// deadline was hit.
    pub async fn wait_with_deadline(&self, deadline: Duration) -> bool {
        if tokio::time::timeout(deadline, self.wait()).await.is_ok() {
            return true;
        }

        warn!(
            seed = %self.seed,
            deadline_ms = deadline.as_millis() as u64,
            outstanding = self.tracker.outstanding(),
            "Crawl deadline reached, cancelling"
        );
        self.cancel();
        self.wait().await;
        false
    }

    /// Snapshot of content and counters
    pub fn report(&self) -> CrawlReport {
        let report = CrawlReport {
            seed: self.seed.to_string(),
            contents: self.contents.to_vec(),
            stats: self.stats.snapshot(),
            duration: self.started.elapsed(),
            cancelled: self.is_cancelled(),
        };

        info!(
            seed = %report.seed,
            pages = report.stats.fetched,
            contents = report.contents.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Crawl job finished"
        );

        report
    }
}
