//! Output module for crawl reports and content exports
//!
//! This module handles:
//! - Summarizing a finished crawl
//! - Printing the summary to the terminal
//! - Exporting the content set as markdown

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_export, write_markdown_export};
pub use stats::print_summary;
pub use traits::{ContentKind, CrawlSummary, OutputError, OutputResult};

use crate::crawler::CrawlReport;
use crate::url::domain_of;

/// Builds a summary from a crawl report
///
/// # Arguments
///
/// * `report` - The report returned by the crawl
///
/// # Returns
///
/// A CrawlSummary with unit counters and a breakdown of the content set
pub fn summarize(report: &CrawlReport) -> CrawlSummary {
    let mut summary = CrawlSummary {
        seed: report.seed.clone(),
        duration: report.duration,
        cancelled: report.cancelled,
        pages_admitted: report.stats.admitted,
        pages_fetched: report.stats.fetched,
        pages_skipped: report.stats.skipped,
        pages_failed: report.stats.failed,
        pages_cancelled: report.stats.cancelled,
        links_discovered: report.stats.links_discovered,
        peak_in_flight: report.stats.peak_in_flight,
        total_contents: report.contents.len(),
        ..CrawlSummary::default()
    };

    for content in &report.contents {
        match ContentKind::of(content) {
            ContentKind::Section { .. } => summary.sections += 1,
            ContentKind::Entity { label, .. } => {
                *summary.entities.entry(label.to_string()).or_insert(0) += 1;
            }
            ContentKind::Other(_) => {}
        }
    }

    for (url, _) in &report.stats.failures {
        let host = domain_of(url).unwrap_or_else(|| "(unknown)".to_string());
        *summary.failures_by_host.entry(host).or_insert(0) += 1;
    }

    summary
}
