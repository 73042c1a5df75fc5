//! Markdown export of crawl contents
//!
//! This module renders a crawl's content set as a human-readable markdown
//! document: run information, statistics, the heading sections, and the
//! labeled entities grouped by label.

use crate::crawler::CrawlReport;
use crate::output::summarize;
use crate::output::traits::{ContentKind, CrawlSummary, OutputResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown export of a crawl report
///
/// # Arguments
///
/// * `report` - The report returned by the crawl
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the export
/// * `Err(OutputError)` - Failed to write the export
pub fn write_markdown_export(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let summary = summarize(report);
    let markdown = format_markdown_export(&summary, &report.contents);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote markdown export to {}", output_path.display());
    Ok(())
}

/// Formats a crawl summary and its content set as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `contents` - The content strings, in the order they were found
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_export(summary: &CrawlSummary, contents: &[String]) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Sitesift Crawl Contents\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration.as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Status**: {}\n\n",
        if summary.cancelled {
            "deadline reached"
        } else {
            "completed"
        }
    ));

    // Overall statistics
    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Pages Admitted**: {}\n", summary.pages_admitted));
    md.push_str(&format!("- **Pages Fetched**: {}\n", summary.pages_fetched));
    md.push_str(&format!("- **Pages Skipped**: {}\n", summary.pages_skipped));
    md.push_str(&format!("- **Pages Failed**: {}\n", summary.pages_failed));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Content Blocks**: {} ({} sections)\n\n",
        summary.total_contents, summary.sections
    ));

    // Sections and entities, in first-seen order
    let mut sections = Vec::new();
    let mut entities: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut other = Vec::new();
    for content in contents {
        match ContentKind::of(content) {
            ContentKind::Section { heading, body } => sections.push((heading, body)),
            ContentKind::Entity { label, value } => {
                entities.entry(label).or_default().push(value)
            }
            ContentKind::Other(text) => other.push(text),
        }
    }

    if !sections.is_empty() {
        md.push_str("## Sections\n\n");
        for (heading, body) in sections {
            let heading = if heading.trim().is_empty() {
                "(untitled)"
            } else {
                heading.trim()
            };
            md.push_str(&format!("### {}\n\n", heading));
            if !body.trim().is_empty() {
                md.push_str(body.trim());
                md.push_str("\n\n");
            }
        }
    }

    if !entities.is_empty() {
        md.push_str("## Entities\n\n");
        for (label, values) in entities {
            md.push_str(&format!("### {} ({})\n\n", label, values.len()));
            for value in values {
                md.push_str(&format!("- {}\n", value));
            }
            md.push('\n');
        }
    }

    if !other.is_empty() {
        md.push_str("## Other\n\n");
        for text in other {
            md.push_str(&format!("- {}\n", text));
        }
        md.push('\n');
    }

    // Failures
    if !summary.failures_by_host.is_empty() {
        md.push_str("## Failures by Host\n\n");
        md.push_str("| Host | Failed Pages |\n");
        md.push_str("|------|--------------|\n");
        for (host, count) in &summary.failures_by_host {
            md.push_str(&format!("| {} | {} |\n", host, count));
        }
        md.push('\n');
    }

    md
}
