//! Database schema definitions
//!
//! One relation holds every delivered link, scoped by the listing page it was
//! found on.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every item link ever delivered, per watched listing page
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    base_link TEXT NOT NULL,
    link TEXT NOT NULL,
    added TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS u_links ON links(base_link, link);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
