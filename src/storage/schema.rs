//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Cellar-Gap database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per item of a locale's daily snapshot; rows are never updated
CREATE TABLE IF NOT EXISTS items (
    name TEXT NOT NULL,
    producer TEXT NOT NULL,
    bottle_size REAL NOT NULL,
    locale TEXT NOT NULL,
    snapshot_date TEXT NOT NULL,
    price REAL NOT NULL,
    url TEXT NOT NULL,
    awarded INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (name, producer, bottle_size, locale, snapshot_date)
);

CREATE INDEX IF NOT EXISTS idx_items_snapshot ON items(locale, snapshot_date);

-- Track (locale, category) crawls
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    locale TEXT NOT NULL,
    category TEXT NOT NULL,
    snapshot_date TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    items_stored INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_snapshot ON runs(snapshot_date);
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
