//! Storage module for handing crawl content to the indexer
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Replacing the stored content set with a crawl's output
//! - Recording which crawl the stored content came from

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{content_hash, RunRecord, SqliteContentStore, STORE_BATCH_SIZE};
pub use traits::{ContentStore, StorageError, StorageResult, StoredDocument};

use crate::SiftError;
use std::path::Path;

/// Opens (or creates) the content store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteContentStore)` - Successfully initialized storage
/// * `Err(SiftError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> Result<SqliteContentStore, SiftError> {
    SqliteContentStore::new(path)
}
