//! State module for tracking crawl progress
//!
//! - `UnitState`: where a single work unit is in its lifecycle
//! - `CrawlStats`: per-job counters shared by all workers

mod stats;
mod unit_state;

pub use stats::{CrawlStats, StatsRecorder};
pub use unit_state::UnitState;
