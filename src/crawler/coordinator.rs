//! Ingestion coordinator - drives one snapshot from listings to storage
//!
//! This module contains the ingestion loop that ties the pipeline together:
//! - Opening a run record per (locale, category)
//! - Pulling raw listings from the category crawler
//! - Normalizing and deduplicating them into a `Catalog`
//! - Persisting the catalog and closing the run

use crate::catalog::{Catalog, Normalizer};
use crate::config::{CrawlerConfig, ExchangeRate, Locale, LocaleConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pagination::CategoryCrawler;
use crate::storage::{RunStatus, Storage, UpsertOutcome};
use crate::CellarError;
use chrono::NaiveDate;
use url::Url;

/// One locale to ingest, with the categories it lists
#[derive(Debug, Clone)]
pub struct LocaleSource {
    pub locale: Locale,
    pub config: LocaleConfig,
    /// Hash of the locale document, recorded on every run
    pub config_hash: String,
}

/// What happened to one category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    pub run_id: i64,
    pub pages_fetched: u32,
    /// Listings returned by the extractor
    pub listings: usize,
    /// Listings dropped because they could not be normalized
    pub rejected: usize,
    /// Items newly written to storage
    pub inserted: u64,
    /// Items already stored for this locale and date
    pub already_present: u64,
}

/// Outcome of a whole ingestion
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub categories: Vec<(Locale, CategoryReport)>,
}

impl IngestSummary {
    pub fn inserted(&self) -> u64 {
        self.categories.iter().map(|(_, c)| c.inserted).sum()
    }

    pub fn already_present(&self) -> u64 {
        self.categories.iter().map(|(_, c)| c.already_present).sum()
    }
}

/// Ingests category listings of one snapshot date into storage
pub struct Ingester<'a, F: PageFetcher + ?Sized, S: Storage> {
    fetcher: &'a F,
    storage: &'a mut S,
    config: &'a CrawlerConfig,
    normalizer: Normalizer<'a>,
    snapshot_date: NaiveDate,
}

impl<'a, F: PageFetcher + ?Sized, S: Storage> Ingester<'a, F, S> {
    pub fn new(
        fetcher: &'a F,
        storage: &'a mut S,
        config: &'a CrawlerConfig,
        rate: &'a ExchangeRate,
        snapshot_date: NaiveDate,
    ) -> Self {
        Self {
            fetcher,
            storage,
            config,
            normalizer: Normalizer::new(rate),
            snapshot_date,
        }
    }

    /// Ingests every category of `source`, in document order
    ///
    /// Stops at the first category whose crawl fails; categories ingested
    /// before it stay persisted.
    pub async fn ingest_locale(
        &mut self,
        source: &LocaleSource,
    ) -> Result<Vec<CategoryReport>, CellarError> {
        tracing::info!(
            "Ingesting {} categories for locale {}",
            source.config.categories.len(),
            source.locale
        );

        let mut reports = Vec::with_capacity(source.config.categories.len());
        for category in &source.config.categories {
            let report = self
                .ingest_category(source.locale, category, &source.config_hash)
                .await?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Crawls one category and persists its deduplicated items
    ///
    /// # Returns
    ///
    /// * `Ok(CategoryReport)` - The run completed
    /// * `Err(CellarError)` - The crawl failed; the run is marked failed and
    ///   nothing of this category is persisted
    pub async fn ingest_category(
        &mut self,
        locale: Locale,
        category: &str,
        config_hash: &str,
    ) -> Result<CategoryReport, CellarError> {
        let category_url = Url::parse(category)?;
        let run_id = self
            .storage
            .create_run(locale, category, config_hash, self.snapshot_date)?;
        tracing::info!("Run {}: crawling {} ({})", run_id, category, locale);

        let mut report = CategoryReport {
            category: category.to_string(),
            run_id,
            ..CategoryReport::default()
        };

        let catalog = match self.collect(locale, category_url, &mut report).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                self.storage.finish_run(run_id, RunStatus::Failed, 0)?;
                return Err(e);
            }
        };

        tracing::info!(
            "Run {}: {} listings, {} rejected, {} unique items",
            run_id,
            report.listings,
            report.rejected,
            catalog.len()
        );

        for item in catalog.iter() {
            match self.storage.upsert_item(item)? {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::AlreadyExists(_) => report.already_present += 1,
            }
        }

        self.storage
            .finish_run(run_id, RunStatus::Completed, report.inserted)?;
        tracing::info!(
            "Run {} completed: {} inserted, {} already present",
            run_id,
            report.inserted,
            report.already_present
        );

        Ok(report)
    }

    async fn collect(
        &self,
        locale: Locale,
        category: Url,
        report: &mut CategoryReport,
    ) -> Result<Catalog, CellarError> {
        let mut crawler = CategoryCrawler::new(self.fetcher, category, locale, self.config);
        let mut catalog = Catalog::new();

        while let Some(raw) = crawler.next_item().await? {
            report.listings += 1;
            match self.normalizer.normalize(&raw, locale, self.snapshot_date) {
                Ok(item) => {
                    catalog.add(item);
                }
                Err(e) => {
                    report.rejected += 1;
                    tracing::warn!("Error ({}) normalizing '{}', skip", e, raw.name);
                }
            }
        }

        report.pages_fetched = crawler.pages_fetched();
        Ok(catalog)
    }
}

/// Ingests every locale in `sources` for `snapshot_date`
///
/// Locales and their categories are processed one after the other. The first
/// failing category aborts the ingestion with its error.
///
/// # Arguments
///
/// * `fetcher` - Source of listing pages
/// * `storage` - Where items and runs are recorded
/// * `sources` - The locales to ingest
/// * `config` - Crawler tuning
/// * `rate` - EUR to GBP rate applied to EUR prices
/// * `snapshot_date` - The date the items are recorded under
pub async fn run_ingest<F: PageFetcher + ?Sized, S: Storage>(
    fetcher: &F,
    storage: &mut S,
    sources: &[LocaleSource],
    config: &CrawlerConfig,
    rate: &ExchangeRate,
    snapshot_date: NaiveDate,
) -> Result<IngestSummary, CellarError> {
    let mut ingester = Ingester::new(fetcher, storage, config, rate, snapshot_date);
    let mut summary = IngestSummary::default();

    for source in sources {
        let reports = ingester.ingest_locale(source).await?;
        summary
            .categories
            .extend(reports.into_iter().map(|report| (source.locale, report)));
    }

    tracing::info!(
        "Ingestion finished: {} categories, {} items inserted, {} already present",
        summary.categories.len(),
        summary.inserted(),
        summary.already_present()
    );
    Ok(summary)
}
