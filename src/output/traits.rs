//! Output types
//!
//! This module defines the summary of a finished crawl and the errors
//! output writers report.

use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One content string, split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind<'a> {
    /// `"heading:\nbody"`
    Section { heading: &'a str, body: &'a str },

    /// `"Label: value"`
    Entity { label: &'a str, value: &'a str },

    /// Anything else
    Other(&'a str),
}

impl<'a> ContentKind<'a> {
    pub fn of(content: &'a str) -> Self {
        if let Some((heading, body)) = content.split_once(":\n") {
            return ContentKind::Section { heading, body };
        }
        if let Some((label, value)) = content.split_once(": ") {
            return ContentKind::Entity { label, value };
        }
        ContentKind::Other(content)
    }
}

/// Summary statistics for a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub seed: String,
    pub duration: Duration,
    pub cancelled: bool,

    // Unit statistics
    pub pages_admitted: usize,
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub pages_cancelled: usize,
    pub links_discovered: usize,
    pub peak_in_flight: usize,

    // Content breakdown
    pub total_contents: usize,
    pub sections: usize,

    /// Entity label -> count
    pub entities: BTreeMap<String, usize>,

    /// Host -> failed fetches
    pub failures_by_host: BTreeMap<String, usize>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of requested pages that returned markup
    pub fn success_rate(&self) -> f64 {
        let requested = self.pages_fetched + self.pages_failed;
        if requested == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / requested as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_section() {
        assert_eq!(
            ContentKind::of("About:\nWe crawl.\nDaily."),
            ContentKind::Section {
                heading: "About",
                body: "We crawl.\nDaily."
            }
        );
    }

    #[test]
    fn test_content_kind_entity() {
        assert_eq!(
            ContentKind::of("GitHub link: https://github.com/acme/repo"),
            ContentKind::Entity {
                label: "GitHub link",
                value: "https://github.com/acme/repo"
            }
        );
    }

    #[test]
    fn test_content_kind_other() {
        assert_eq!(ContentKind::of("plain"), ContentKind::Other("plain"));
    }

    #[test]
    fn test_success_rate() {
        let mut summary = CrawlSummary::new();
        summary.pages_fetched = 80;
        summary.pages_failed = 20;
        assert!((summary.success_rate() - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        assert_eq!(CrawlSummary::new().success_rate(), 0.0);
    }
}
