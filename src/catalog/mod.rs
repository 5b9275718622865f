//! Catalog module: the canonical item model
//!
//! This module turns scraped listing fields into comparable items:
//! - `RawItemBlock`: the fields exactly as scraped from one listing
//! - `Item`: the canonical, persisted form (GBP price, bottle size, normalized text)
//! - `ItemKey`: the identity used to join the two locales
//! - `Normalizer`: raw fields to `Item`
//! - `Catalog`: per-crawl deduplication keeping the cheapest listing

mod aggregate;
mod normalize;

pub use aggregate::Catalog;
pub use normalize::{
    normalize_text, parse_bottle_size, parse_price, round2, strip_producer_suffix,
    ItemParseError, Normalizer, DEFAULT_BOTTLE_SIZE,
};

use crate::config::Locale;
use chrono::NaiveDate;
use std::fmt;

/// Fields of one listing as scraped, before any normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItemBlock {
    pub name: String,
    pub price: String,
    pub producer: String,
    /// Text of each award marker attached to the listing
    pub awards: Vec<String>,
    /// Absolute URL of the product detail page
    pub url: String,
}

/// A canonical item of one locale's snapshot
///
/// The price is always expressed in GBP.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub name: String,
    pub producer: String,
    /// Bottle size in liters
    pub bottle_size: f64,
    pub price: f64,
    pub url: String,
    pub awarded: bool,
    pub locale: Locale,
    pub snapshot_date: NaiveDate,
}

impl Item {
    /// The cross-locale join identity of this item
    pub fn key(&self) -> ItemKey {
        ItemKey::new(&self.name, &self.producer, self.bottle_size)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}l: £{:.2} (awards: {}, {}, {})",
            self.name,
            self.producer,
            self.bottle_size,
            self.price,
            self.awarded,
            self.locale,
            self.url
        )
    }
}

/// Identity of a physical product across locales and dates
///
/// The bottle size is held in millilitres so the key can be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub name: String,
    pub producer: String,
    pub bottle_size_ml: u32,
}

impl ItemKey {
    pub fn new(name: &str, producer: &str, bottle_size: f64) -> Self {
        Self {
            name: name.to_string(),
            producer: producer.to_string(),
            bottle_size_ml: (bottle_size * 1000.0).round() as u32,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.name, self.producer, self.bottle_size_ml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, producer: &str, bottle_size: f64, locale: Locale) -> Item {
        Item {
            name: name.to_string(),
            producer: producer.to_string(),
            bottle_size,
            price: 10.0,
            url: "https://shop.example.com/p/1".to_string(),
            awarded: false,
            locale,
            snapshot_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_key_ignores_locale_and_price() {
        let eng = item("barolo 2016", "gaja", 0.75, Locale::English);
        let mut ita = item("barolo 2016", "gaja", 0.75, Locale::Italian);
        ita.price = 42.0;
        assert_eq!(eng.key(), ita.key());
    }

    #[test]
    fn test_key_distinguishes_bottle_size() {
        let standard = item("barolo 2016", "gaja", 0.75, Locale::English);
        let magnum = item("barolo 2016", "gaja", 1.5, Locale::English);
        assert_ne!(standard.key(), magnum.key());
        assert_eq!(magnum.key().bottle_size_ml, 1500);
    }

    #[test]
    fn test_key_is_stable_for_computed_sizes() {
        // 0.75 * 3 carries float noise; the key must not
        assert_eq!(ItemKey::new("a", "b", 0.75 * 3.0), ItemKey::new("a", "b", 2.25));
        assert_eq!(ItemKey::new("a", "b", 0.375).bottle_size_ml, 375);
    }
}
