//! Storage module for remembering delivered links
//!
//! This module handles all database operations for the watcher:
//! - SQLite schema management
//! - Set difference between a crawl and what was already delivered
//! - Recording newly delivered links

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteLinkStore;
pub use traits::{LinkStore, StorageError, StorageResult};

use crate::config::{expand_path, StorageConfig};
use chrono::{DateTime, Utc};

/// Creates the SQLite link store described by the configuration
///
/// The database is not touched until the first operation; call
/// [`LinkStore::ensure_schema`] before using it.
pub fn open_store(config: &StorageConfig) -> SqliteLinkStore {
    SqliteLinkStore::new(expand_path(&config.database_path))
}

/// One delivered link as persisted in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRecord {
    pub id: i64,
    pub source_link: String,
    pub item_link: String,
    pub inserted_at: DateTime<Utc>,
}
