//! Per-job crawl counters
//!
//! Workers update a shared `StatsRecorder` with relaxed atomics; the job takes
//! a `CrawlStats` snapshot once every unit has finished.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Snapshot of one crawl job's counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs that won frontier admission (one unit each)
    pub admitted: usize,

    /// Units whose fetch returned markup
    pub fetched: usize,

    /// Units dropped by the skip rule
    pub skipped: usize,

    /// Units whose fetch failed after retries
    pub failed: usize,

    /// Units dropped before fetching because the job was cancelled
    pub cancelled: usize,

    /// Units that reached `Completed`
    pub completed: usize,

    /// Outbound links seen across all extracted pages
    pub links_discovered: usize,

    /// Highest number of units fetching or extracting at the same time
    pub peak_in_flight: usize,

    /// Failed URLs with the classified reason
    pub failures: Vec<(String, String)>,
}

impl CrawlStats {
    /// Units that reached a terminal state
    pub fn finished(&self) -> usize {
        self.completed + self.skipped + self.cancelled
    }
}

/// Shared, lock-light recorder behind `CrawlStats`
#[derive(Debug, Default)]
pub struct StatsRecorder {
    admitted: AtomicUsize,
    fetched: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    completed: AtomicUsize,
    links_discovered: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    failures: Mutex<Vec<(String, String)>>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self, url: &str, reason: String) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((url.to_string(), reason));
        }
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_links(&self, count: usize) {
        self.links_discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Marks a unit as holding a concurrency slot
    pub fn enter_flight(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    /// Marks a unit as having released its concurrency slot
    pub fn leave_flight(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
            failures: self
                .failures
                .lock()
                .map(|f| f.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_maximum() {
        let stats = StatsRecorder::new();
        stats.enter_flight();
        stats.enter_flight();
        stats.leave_flight();
        stats.enter_flight();
        stats.enter_flight();
        assert_eq!(stats.in_flight(), 3);
        stats.leave_flight();
        stats.leave_flight();
        stats.leave_flight();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.peak_in_flight, 3);
        assert_eq!(stats.in_flight(), 0);
    }

    #[test]
    fn test_failures_are_listed() {
        let stats = StatsRecorder::new();
        stats.record_failed("https://example.com/a", "HTTP 503".to_string());
        stats.record_completed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(
            snapshot.failures,
            vec![("https://example.com/a".to_string(), "HTTP 503".to_string())]
        );
    }

    #[test]
    fn test_finished_counts_terminal_units() {
        let stats = StatsRecorder::new();
        for _ in 0..3 {
            stats.record_admitted();
        }
        stats.record_completed();
        stats.record_skipped();
        stats.record_cancelled();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.finished(), snapshot.admitted);
    }
}
