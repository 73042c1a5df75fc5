//! Storage traits and error types
//!
//! This module defines the interface of the downstream indexer and the
//! errors its implementations report.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stored content string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: i64,
    pub content: String,

    /// Hex-encoded SHA-256 of `content`
    pub content_hash: String,

    /// RFC 3339 timestamp of the store call that wrote the row
    pub stored_at: String,
}

/// The indexer a crawl hands its content set to
pub trait ContentStore {
    /// Replaces everything previously stored with `contents`
    ///
    /// Returns the number of documents written. An empty list writes
    /// nothing and leaves the stored documents in place.
    fn store(&mut self, contents: &[String]) -> StorageResult<usize>;

    /// Number of stored documents
    fn count(&self) -> StorageResult<usize>;

    /// All stored documents in insertion order
    fn load_all(&self) -> StorageResult<Vec<StoredDocument>>;
}
