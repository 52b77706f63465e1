//! Storage traits and error types
//!
//! This module defines the trait interface for seen-link stores and the
//! associated error types.

use crate::storage::SeenRecord;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database {path} unavailable: {source}")]
    Unavailable {
        path: String,
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid timestamp in store: {0}")]
    InvalidTimestamp(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable set of (source link, item link) pairs that were already delivered
///
/// Link sets are `BTreeSet<String>`, so every enumeration is in byte-wise
/// lexicographic order. Links are compared verbatim; no URL normalization
/// takes place.
pub trait LinkStore: Send + Sync {
    /// Creates the backing structure if it does not exist yet
    ///
    /// Safe to call on every startup.
    fn ensure_schema(&self) -> StorageResult<()>;

    /// Returns the candidates not yet recorded for `source`
    ///
    /// This is a pure read and never changes the store.
    fn filter_unseen(
        &self,
        source: &str,
        candidates: &BTreeSet<String>,
    ) -> StorageResult<BTreeSet<String>>;

    /// Records every link for `source`
    ///
    /// Pairs that are already present are skipped silently. An empty set is a
    /// no-op.
    ///
    /// # Returns
    ///
    /// The number of pairs that were actually inserted
    fn record_seen(&self, source: &str, links: &BTreeSet<String>) -> StorageResult<usize>;

    /// Lists everything recorded for `source`, ordered by item link
    fn seen_links(&self, source: &str) -> StorageResult<Vec<SeenRecord>>;
}
