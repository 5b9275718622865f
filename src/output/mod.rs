//! Output module for comparisons, reports and statistics
//!
//! This module handles:
//! - Joining two locales' snapshots and filtering by price gap
//! - Writing the CSV report
//! - Printing snapshot and run statistics

mod compare;
mod report;
pub mod stats;

pub use compare::{compare, match_items, sort_rows, ComparisonRequest, MatchedPair, ReportRow};
pub use report::{report_header, write_report, write_rows};
pub use stats::{load_statistics, print_statistics, SnapshotStatistics};

use crate::config::Locale;
use thiserror::Error;

/// Errors raised while comparing or writing the report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Preferred and compare locale are both '{0}'")]
    SameLocale(Locale),

    #[error("Invalid max diff: {0}")]
    InvalidThreshold(f64),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
