//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LinkStore trait.
//! A connection is opened for each operation and dropped at the end of it, so
//! no handle is held across poll cycles.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LinkStore, StorageError, StorageResult};
use crate::storage::SeenRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a connection waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite storage backend
#[derive(Debug, Clone)]
pub struct SqliteLinkStore {
    path: PathBuf,
}

impl SqliteLinkStore {
    /// Creates a store backed by the database file at `path`
    ///
    /// Nothing is opened until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> StorageResult<Connection> {
        let conn = Connection::open(&self.path).map_err(|source| StorageError::Unavailable {
            path: self.path.display().to_string(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

impl LinkStore for SqliteLinkStore {
    fn ensure_schema(&self) -> StorageResult<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )
        .map_err(|source| StorageError::Unavailable {
            path: self.path.display().to_string(),
            source,
        })?;

        initialize_schema(&conn)?;
        tracing::debug!("Link store schema ready at {}", self.path.display());
        Ok(())
    }

    fn filter_unseen(
        &self,
        source: &str,
        candidates: &BTreeSet<String>,
    ) -> StorageResult<BTreeSet<String>> {
        if candidates.is_empty() {
            return Ok(BTreeSet::new());
        }

        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT 1 FROM links WHERE base_link = ?1 AND link = ?2")?;

        let mut unseen = BTreeSet::new();
        for link in candidates {
            if !stmt.exists(params![source, link])? {
                unseen.insert(link.clone());
            }
        }

        Ok(unseen)
    }

    fn record_seen(&self, source: &str, links: &BTreeSet<String>) -> StorageResult<usize> {
        if links.is_empty() {
            return Ok(0);
        }

        let mut conn = self.open()?;
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO links (base_link, link, added) VALUES (?1, ?2, ?3)",
            )?;
            for link in links {
                inserted += stmt.execute(params![source, link, now])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn seen_links(&self, source: &str) -> StorageResult<Vec<SeenRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, base_link, link, added FROM links WHERE base_link = ?1 ORDER BY link",
        )?;

        let rows = stmt.query_map(params![source], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, source_link, item_link, added) = row?;
            let inserted_at = DateTime::parse_from_rfc3339(&added)
                .map_err(|_| StorageError::InvalidTimestamp(added.clone()))?
                .with_timezone(&Utc);
            records.push(SeenRecord {
                id,
                source_link,
                item_link,
                inserted_at,
            });
        }

        Ok(records)
    }
}
