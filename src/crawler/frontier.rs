//! Per-job record of every URL already scheduled or visited

use crate::url::normalize_url;
use dashmap::DashSet;
use tracing::trace;
use url::Url;

/// Concurrent admit-once set of normalized URLs
///
/// Admission is a single insert into a sharded set, so when several workers
/// discover the same page at the same time exactly one of them wins.
#[derive(Debug, Default)]
pub struct Frontier {
    seen: DashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits `url` if no equivalent URL was admitted before
    ///
    /// Returns the parsed URL to fetch (as given, not normalized) for the
    /// first caller, `None` for duplicates and for anything that is not an
    /// absolute http(s) URL with a host.
    ///
    /// # Example
    ///
    /// ```
    /// use sitesift::crawler::Frontier;
    ///
    /// let frontier = Frontier::new();
    /// assert!(frontier.try_admit("https://example.com/about/").is_some());
    /// assert!(frontier.try_admit("https://EXAMPLE.com/about#team").is_none());
    /// ```
    pub fn try_admit(&self, url: &str) -> Option<Url> {
        let key = match normalize_url(url) {
            Ok(normalized) => normalized.to_string(),
            Err(e) => {
                trace!(url, error = %e, "Not admitting URL");
                return None;
            }
        };

        let target = Url::parse(url.trim()).ok()?;
        if self.seen.insert(key) {
            Some(target)
        } else {
            None
        }
    }

    /// Whether an equivalent URL was already admitted
    pub fn contains(&self, url: &str) -> bool {
        normalize_url(url)
            .map(|normalized| self.seen.contains(normalized.as_str()))
            .unwrap_or(false)
    }

    /// Number of admitted URLs
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
