//! Crawler module for category listing ingestion
//!
//! This module contains the ingestion pipeline, including:
//! - HTTP fetching of listing pages behind the `PageFetcher` trait
//! - HTML extraction of raw listings
//! - Pagination with timeout retries driven by `CrawlState`
//! - Overall ingestion coordination into storage

mod coordinator;
mod fetcher;
mod pagination;
mod parser;

pub use coordinator::{run_ingest, CategoryReport, IngestSummary, Ingester, LocaleSource};
pub use fetcher::{build_http_client, FetchOutcome, HttpPageFetcher, PageFetcher};
pub use pagination::{CategoryCrawler, PageOutcome};
pub use parser::{ExtractError, InvalidPage, ItemExtractor};

use crate::config::{CrawlerConfig, ExchangeRate};
use crate::storage::Storage;
use crate::CellarError;
use chrono::NaiveDate;

/// Runs a complete ingestion over HTTP
///
/// This is the main entry point for ingesting a snapshot. It will:
/// 1. Build the HTTP client
/// 2. Crawl every category of every locale, one after the other
/// 3. Normalize and deduplicate the listings of each category
/// 4. Persist the items and record one run per category
///
/// # Arguments
///
/// * `storage` - Where items and runs are recorded
/// * `sources` - The locales to ingest
/// * `config` - Crawler tuning
/// * `rate` - EUR to GBP rate
/// * `snapshot_date` - The date the items are recorded under
///
/// # Returns
///
/// * `Ok(IngestSummary)` - Every category was ingested
/// * `Err(CellarError)` - A category failed; earlier categories stay persisted
pub async fn ingest<S: Storage>(
    storage: &mut S,
    sources: &[LocaleSource],
    config: &CrawlerConfig,
    rate: &ExchangeRate,
    snapshot_date: NaiveDate,
) -> Result<IngestSummary, CellarError> {
    let fetcher = HttpPageFetcher::new(config)?;
    run_ingest(&fetcher, storage, sources, config, rate, snapshot_date).await
}
