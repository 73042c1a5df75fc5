//! Sitesift main entry point
//!
//! This is the command-line interface for the Sitesift crawler.

use clap::Parser;
use sitesift::config::{load_config_with_hash, validate, Config};
use sitesift::crawler::run_blocking;
use sitesift::output::{print_summary, summarize, write_markdown_export};
use sitesift::storage::{open_store, ContentStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Sitesift: a bounded-concurrency site crawler
///
/// Sitesift walks the pages reachable from a seed URL up to a depth bound,
/// reduces each page to heading sections and labeled contact/profile links,
/// and prints what it found.
#[derive(Parser, Debug)]
#[command(name = "sitesift")]
#[command(version)]
#[command(about = "A bounded-concurrency site crawler and content extractor", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the maximum link depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the number of pages processed at once
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Stop starting new fetches after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Replace the contents of the SQLite store with this crawl's output
    #[arg(long)]
    store: bool,

    /// Write a markdown export of the crawl contents
    /// (to `output.export-path` when FILE is omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<Option<PathBuf>>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load, override and validate configuration
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, hash)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => (Config::default(), "default".to_string()),
    };

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_pages = concurrency;
    }
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.seed);
        return Ok(());
    }

    handle_crawl(config, &config_hash, &cli)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitesift=info,warn"),
            1 => EnvFilter::new("sitesift=debug,info"),
            2 => EnvFilter::new("sitesift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, seed: &str) {
    println!("=== Sitesift Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages
    );
    println!("  Retry limit: {}", config.crawler.retry_limit);
    println!(
        "  Backoff: {}ms base, {}ms max",
        config.crawler.backoff_base_ms, config.crawler.backoff_max_ms
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  Worker threads: {}", config.crawler.worker_threads);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nDynamic Pages:");
    if config.dynamic.enabled {
        println!("  Browser: {}", config.dynamic.browser_path);
        println!(
            "  Max concurrent renders: {}",
            config.dynamic.max_concurrent_renders
        );
        println!("  URL markers: {}", config.dynamic.url_markers.join(", "));
        for pattern in &config.dynamic.host_patterns {
            println!("  Host pattern: {}", pattern);
        }
    } else {
        println!("  Disabled (plain HTTP only)");
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export: {}", config.output.export_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
fn handle_crawl(
    config: Config,
    config_hash: &str,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let database_path = config.output.database_path.clone();
    let export_path = cli
        .output
        .as_ref()
        .map(|path| path.clone().unwrap_or_else(|| PathBuf::from(&config.output.export_path)));
    let deadline = cli.deadline.map(Duration::from_secs);

    let report = match run_blocking(config, &cli.seed, deadline) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_summary(&summarize(&report));
    }

    if cli.store {
        if report.contents.is_empty() {
            tracing::warn!("Crawl produced no content, leaving {} untouched", database_path);
        } else {
            let mut store = open_store(Path::new(&database_path))?;
            let written = store.store(&report.contents)?;
            store.record_run(&report.seed, config_hash, written)?;
            tracing::info!("Stored {} documents in {}", written, database_path);
        }
    }

    if let Some(path) = &export_path {
        write_markdown_export(&report, path)?;
        if !cli.quiet {
            println!("\n✓ Contents exported to: {}", path.display());
        }
    }

    Ok(())
}
