//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::catalog::Item;
use crate::config::Locale;
use crate::storage::{RunRecord, RunStatus};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What an upsert did
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// The item was new and has been stored
    Inserted,

    /// An item with the same identity, locale and date was already stored;
    /// it is returned unchanged
    AlreadyExists(Item),
}

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by ingestion and
/// comparison. Items are identified by (name, producer, bottle size, locale,
/// snapshot date) and are never modified once stored.
pub trait Storage {
    // ===== Item Snapshots =====

    /// Stores an item unless one with the same identity already exists
    ///
    /// An existing item is never overwritten, which makes re-running the
    /// ingestion of a day idempotent.
    fn upsert_item(&mut self, item: &Item) -> StorageResult<UpsertOutcome>;

    /// Gets the stored item sharing `item`'s persistence identity
    fn get_item(&self, item: &Item) -> StorageResult<Option<Item>>;

    /// Gets every item of one locale's snapshot
    fn items_for(&self, locale: Locale, snapshot_date: NaiveDate) -> StorageResult<Vec<Item>>;

    /// Counts the items of one locale's snapshot
    fn count_items(&self, locale: Locale, snapshot_date: NaiveDate) -> StorageResult<u64>;

    /// Gets every snapshot date with stored items, newest first
    fn snapshot_dates(&self) -> StorageResult<Vec<NaiveDate>>;

    // ===== Run Management =====

    /// Records the start of a (locale, category) crawl
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(
        &mut self,
        locale: Locale,
        category: &str,
        config_hash: &str,
        snapshot_date: NaiveDate,
    ) -> StorageResult<i64>;

    /// Marks a run as finished with its final status
    fn finish_run(&mut self, run_id: i64, status: RunStatus, items_stored: u64)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>>;
}
