//! Terminal output of crawl summaries

use crate::output::traits::CrawlSummary;

/// Prints crawl statistics to stdout
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Seed: {}", summary.seed);
    println!(
        "Duration: {:.2}s{}",
        summary.duration.as_secs_f64(),
        if summary.cancelled {
            " (deadline reached, partial results)"
        } else {
            ""
        }
    );
    println!();

    println!("Pages:");
    println!("  Admitted: {}", summary.pages_admitted);
    println!("  Fetched: {}", summary.pages_fetched);
    println!("  Skipped (media): {}", summary.pages_skipped);
    println!("  Failed: {}", summary.pages_failed);
    if summary.pages_cancelled > 0 {
        println!("  Cancelled: {}", summary.pages_cancelled);
    }
    println!("  Links discovered: {}", summary.links_discovered);
    println!("  Peak concurrent pages: {}", summary.peak_in_flight);
    println!();

    println!("Content:");
    println!("  Total: {}", summary.total_contents);
    println!("  Sections: {}", summary.sections);

    // Sort labels by count (descending)
    let mut entity_counts: Vec<_> = summary.entities.iter().collect();
    entity_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (label, count) in entity_counts {
        println!("  {}: {}", label, count);
    }
    println!();

    if !summary.failures_by_host.is_empty() {
        println!("Failures by Host:");
        for (host, count) in &summary.failures_by_host {
            println!("  {}: {}", host, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} requested pages fetched)",
        summary.success_rate(),
        summary.pages_fetched,
        summary.pages_fetched + summary.pages_failed
    );
}
