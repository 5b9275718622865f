//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::catalog::Item;
use crate::config::Locale;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult, UpsertOutcome};
use crate::storage::{RunRecord, RunStatus};
use crate::CellarError;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

const ITEM_COLUMNS: &str =
    "name, producer, bottle_size, locale, snapshot_date, price, url, awarded";

const RUN_COLUMNS: &str = "id, locale, category, snapshot_date, started_at, finished_at, \
     config_hash, status, items_stored";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CellarError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CellarError> {
        Ok(Self {
            conn: init_database(path)?,
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CellarError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Item Snapshots =====

    fn upsert_item(&mut self, item: &Item) -> StorageResult<UpsertOutcome> {
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO items ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                ITEM_COLUMNS
            ),
            params![
                item.name,
                item.producer,
                item.bottle_size,
                item.locale.code(),
                item.snapshot_date.to_string(),
                item.price,
                item.url,
                item.awarded
            ],
        );

        match inserted {
            Ok(_) => Ok(UpsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                tracing::warn!("Integrity conflict for item {}", item);
                let existing = self
                    .get_item(item)?
                    .ok_or_else(|| StorageError::ItemNotFound(item.key().to_string()))?;
                tracing::info!("Existing item: {}", existing);
                Ok(UpsertOutcome::AlreadyExists(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_item(&self, item: &Item) -> StorageResult<Option<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items
             WHERE name = ?1 AND producer = ?2 AND bottle_size = ?3
               AND locale = ?4 AND snapshot_date = ?5",
            ITEM_COLUMNS
        ))?;

        let existing = stmt
            .query_row(
                params![
                    item.name,
                    item.producer,
                    item.bottle_size,
                    item.locale.code(),
                    item.snapshot_date.to_string()
                ],
                item_from_row,
            )
            .optional()?;

        Ok(existing)
    }

    fn items_for(&self, locale: Locale, snapshot_date: NaiveDate) -> StorageResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items WHERE locale = ?1 AND snapshot_date = ?2 ORDER BY rowid",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map(
                params![locale.code(), snapshot_date.to_string()],
                item_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn count_items(&self, locale: Locale, snapshot_date: NaiveDate) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE locale = ?1 AND snapshot_date = ?2",
            params![locale.code(), snapshot_date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn snapshot_dates(&self) -> StorageResult<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT snapshot_date FROM items ORDER BY snapshot_date DESC")?;

        let dates = stmt
            .query_map([], |row| date_column(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dates)
    }

    // ===== Run Management =====

    fn create_run(
        &mut self,
        locale: Locale,
        category: &str,
        config_hash: &str,
        snapshot_date: NaiveDate,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (locale, category, snapshot_date, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                locale.code(),
                category,
                snapshot_date.to_string(),
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        items_stored: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, items_stored = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, items_stored as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        stmt.query_row(params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        name: row.get(0)?,
        producer: row.get(1)?,
        bottle_size: row.get(2)?,
        locale: locale_column(row, 3)?,
        snapshot_date: date_column(row, 4)?,
        price: row.get(5)?,
        url: row.get(6)?,
        awarded: row.get(7)?,
    })
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(7)?;
    let items_stored: i64 = row.get(8)?;
    Ok(RunRecord {
        id: row.get(0)?,
        locale: locale_column(row, 1)?,
        category: row.get(2)?,
        snapshot_date: date_column(row, 3)?,
        started_at: row.get(4)?,
        finished_at: row.get(5)?,
        config_hash: row.get(6)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Failed),
        items_stored: items_stored.max(0) as u64,
    })
}

fn locale_column(row: &Row, index: usize) -> rusqlite::Result<Locale> {
    let code: String = row.get(index)?;
    Locale::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("unknown locale '{}'", code).into(),
        )
    })
}

fn date_column(row: &Row, index: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(index)?;
    text.parse::<NaiveDate>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    // Another process may be ingesting into the same file
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
