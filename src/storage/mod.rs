//! Storage module for persisting snapshots
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Item snapshots, one per (locale, day), append-only
//! - Idempotent upserts: re-ingesting a day never overwrites a stored item
//! - Run tracking for every (locale, category) crawl

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult, UpsertOutcome};

use crate::config::Locale;
use crate::CellarError;
use chrono::NaiveDate;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(CellarError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CellarError> {
    SqliteStorage::new(path)
}

/// Represents one (locale, category) crawl
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub locale: Locale,
    pub category: String,
    pub snapshot_date: NaiveDate,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub items_stored: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
