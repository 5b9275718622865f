//! Cross-locale comparison
//!
//! Joins two locales' snapshots of the same date by [`ItemKey`] and keeps the
//! items whose preferred-locale price exceeds the compare-locale price by at
//! most the threshold.

use crate::catalog::{round2, Item, ItemKey};
use crate::config::Locale;
use crate::output::ReportError;
use crate::storage::Storage;
use crate::CellarError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// What to compare
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRequest {
    /// The locale whose prices are the reference for the delta
    pub preferred: Locale,
    pub compare: Locale,
    pub snapshot_date: NaiveDate,
    /// Largest `preferred - compare` price difference still reported
    pub max_diff: f64,
}

impl ComparisonRequest {
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.preferred == self.compare {
            return Err(ReportError::SameLocale(self.preferred));
        }
        if !self.max_diff.is_finite() {
            return Err(ReportError::InvalidThreshold(self.max_diff));
        }
        Ok(())
    }
}

/// The two listings of one product, with their price delta
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub preferred: Item,
    pub compare: Item,
    /// `preferred.price - compare.price`, unrounded
    pub delta: f64,
}

impl MatchedPair {
    pub fn key(&self) -> ItemKey {
        self.preferred.key()
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub producer: String,
    pub bottle_size: f64,
    pub price_compare: f64,
    pub price_preferred: f64,
    /// Delta rounded to two decimals
    pub diff: f64,
    /// True if either listing carries an award
    pub awards: bool,
    pub url_compare: String,
    pub url_preferred: String,
}

impl From<&MatchedPair> for ReportRow {
    fn from(pair: &MatchedPair) -> Self {
        Self {
            name: pair.preferred.name.clone(),
            producer: pair.preferred.producer.clone(),
            bottle_size: pair.preferred.bottle_size,
            price_compare: pair.compare.price,
            price_preferred: pair.preferred.price,
            diff: round2(pair.delta),
            awards: pair.preferred.awarded || pair.compare.awarded,
            url_compare: pair.compare.url.clone(),
            url_preferred: pair.preferred.url.clone(),
        }
    }
}

/// Pairs the items of both locales and keeps those within the threshold
///
/// Identities listed in only one locale are dropped. The filter applies to
/// the delta rounded to cents so float noise on two-decimal prices cannot
/// push an exact match over the threshold.
pub fn match_items(
    preferred: Vec<Item>,
    compare: Vec<Item>,
    max_diff: f64,
) -> Vec<MatchedPair> {
    let mut others: HashMap<ItemKey, Item> =
        compare.into_iter().map(|item| (item.key(), item)).collect();

    let mut pairs = Vec::new();
    let mut common = 0usize;
    for item in preferred {
        let other = match others.remove(&item.key()) {
            Some(other) => other,
            None => continue,
        };
        common += 1;

        let delta = item.price - other.price;
        if round2(delta) <= max_diff {
            pairs.push(MatchedPair {
                preferred: item,
                compare: other,
                delta,
            });
        }
    }

    tracing::info!("There are {} items in common", common);
    pairs
}

/// Sorts rows by diff, then name, then producer
pub fn sort_rows(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| {
        a.diff
            .total_cmp(&b.diff)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.producer.cmp(&b.producer))
    });
}

/// Compares two locales' snapshots
///
/// # Arguments
///
/// * `storage` - Where the snapshots were persisted
/// * `request` - Locales, date and threshold
///
/// # Returns
///
/// * `Ok(Vec<ReportRow>)` - The matching rows, cheapest gap first
/// * `Err(CellarError)` - The request is invalid or storage failed
pub fn compare(
    storage: &dyn Storage,
    request: &ComparisonRequest,
) -> Result<Vec<ReportRow>, CellarError> {
    request.validate()?;

    let preferred = storage.items_for(request.preferred, request.snapshot_date)?;
    tracing::info!(
        "Preferred locale {} items: {}",
        request.preferred,
        preferred.len()
    );
    let compare = storage.items_for(request.compare, request.snapshot_date)?;
    tracing::info!("Compare locale {} items: {}", request.compare, compare.len());

    let pairs = match_items(preferred, compare, request.max_diff);

    let mut rows: Vec<ReportRow> = pairs.iter().map(ReportRow::from).collect();
    sort_rows(&mut rows);

    for row in &rows {
        tracing::warn!(
            "Item: {} - {} - {}: price in {}: {:.2} price in {}: {:.2} diff: {:.2} awards: {} \
             {} url: {} {} url: {}",
            row.name,
            row.producer,
            row.bottle_size,
            request.compare,
            row.price_compare,
            request.preferred,
            row.price_preferred,
            row.diff,
            row.awards,
            request.compare,
            row.url_compare,
            request.preferred,
            row.url_preferred
        );
    }

    Ok(rows)
}
