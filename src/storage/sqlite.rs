//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ContentStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ContentStore, StorageResult, StoredDocument};
use crate::SiftError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Documents written per batch inside the store transaction
pub const STORE_BATCH_SIZE: usize = 100;

/// A crawl whose content was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub seed: String,
    pub config_hash: String,
    pub document_count: usize,
    pub stored_at: String,
}

/// SQLite content store
pub struct SqliteContentStore {
    conn: Connection,
}

impl SqliteContentStore {
    /// Creates a new SqliteContentStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteContentStore)` - Successfully opened/created database
    /// * `Err(SiftError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SiftError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SiftError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Records which crawl produced the stored documents
    pub fn record_run(
        &mut self,
        seed: &str,
        config_hash: &str,
        document_count: usize,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs (seed, config_hash, document_count, stored_at) VALUES (?1, ?2, ?3, ?4)",
            params![seed, config_hash, document_count as i64, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seed, config_hash, document_count, stored_at FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    seed: row.get(1)?,
                    config_hash: row.get(2)?,
                    document_count: row.get::<_, i64>(3)? as usize,
                    stored_at: row.get(4)?,
                })
            })
            .optional()?;

        Ok(run)
    }
}

impl ContentStore for SqliteContentStore {
    fn store(&mut self, contents: &[String]) -> StorageResult<usize> {
        if contents.is_empty() {
            tracing::warn!("Received an empty content list for storage, keeping stored documents");
            return Ok(0);
        }

        let stored_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let removed = tx.execute("DELETE FROM documents", [])?;
        tracing::debug!("Removed {} previously stored documents", removed);

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO documents (content, content_hash, stored_at) VALUES (?1, ?2, ?3)",
            )?;

            for (index, batch) in contents.chunks(STORE_BATCH_SIZE).enumerate() {
                for content in batch {
                    stmt.execute(params![content, content_hash(content), stored_at])?;
                }
                tracing::debug!("Stored batch {} ({} documents)", index + 1, batch.len());
            }
        }

        tx.commit()?;
        tracing::info!("Stored {} documents", contents.len());
        Ok(contents.len())
    }

    fn count(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_all(&self) -> StorageResult<Vec<StoredDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, content_hash, stored_at FROM documents ORDER BY id",
        )?;

        let documents = stmt
            .query_map([], |row| {
                Ok(StoredDocument {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    content_hash: row.get(2)?,
                    stored_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }
}

/// Hex-encoded SHA-256 of a content string
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_in_memory() {
        let store = SqliteContentStore::new_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_store_and_load() {
        let mut store = SqliteContentStore::new_in_memory().unwrap();
        let written = store
            .store(&contents(&["About:\nWe crawl.", "Email: a@example.com"]))
            .unwrap();
        assert_eq!(written, 2);

        let documents = store.load_all().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].content, "About:\nWe crawl.");
        assert_eq!(documents[1].content, "Email: a@example.com");
        assert_eq!(documents[0].content_hash, content_hash("About:\nWe crawl."));
        assert_eq!(documents[0].stored_at, documents[1].stored_at);
    }

    #[test]
    fn test_store_replaces_previous_contents() {
        let mut store = SqliteContentStore::new_in_memory().unwrap();
        store.store(&contents(&["old 1", "old 2", "old 3"])).unwrap();
        store.store(&contents(&["new"])).unwrap();

        let documents = store.load_all().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "new");
    }

    #[test]
    fn test_store_spanning_several_batches() {
        let mut store = SqliteContentStore::new_in_memory().unwrap();
        let many: Vec<String> = (0..250).map(|i| format!("Section {}:\nbody", i)).collect();

        assert_eq!(store.store(&many).unwrap(), 250);
        assert_eq!(store.count().unwrap(), 250);
    }

    #[test]
    fn test_store_empty_keeps_previous_contents() {
        let mut store = SqliteContentStore::new_in_memory().unwrap();
        store.store(&contents(&["About:\nWe crawl."])).unwrap();

        assert_eq!(store.store(&[]).unwrap(), 0);

        let documents = store.load_all().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "About:\nWe crawl.");
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_record_run() {
        let mut store = SqliteContentStore::new_in_memory().unwrap();
        assert!(store.latest_run().unwrap().is_none());

        let id = store.record_run("https://example.com/", "abc123", 7).unwrap();
        let run = store.latest_run().unwrap().unwrap();
        assert_eq!(run.id, id);
        assert_eq!(run.seed, "https://example.com/");
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.document_count, 7);
    }
}
