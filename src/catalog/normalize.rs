//! Listing normalization
//!
//! Converts the raw fields of one listing into an [`Item`] whose identity is
//! the same in both locales:
//! - prices in GBP, whatever the storefront currency
//! - bottle size parsed out of the title
//! - producer name removed when repeated at the end of the title
//! - typographic quotes and dashes folded to ASCII, lowercase

use crate::catalog::{Item, RawItemBlock};
use crate::config::{ExchangeRate, Locale};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Bottle size assumed when the title does not say otherwise (liters)
pub const DEFAULT_BOTTLE_SIZE: f64 = 0.75;

/// Errors raised while normalizing a single listing
#[derive(Debug, Error, PartialEq)]
pub enum ItemParseError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Malformed price '{0}'")]
    MalformedPrice(String),

    #[error("Unknown currency in price '{0}'")]
    UnknownCurrency(String),
}

/// Multi-bottle packs, e.g. "(3 bottiglie)"
static BOTTLE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((\d+) (?:bottiglie|bottles)\)").expect("valid regex"));

/// Named bottle sizes, checked in order
static SIZE_KEYWORDS: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    [
        (r"(?i)0\.375 ?l", 0.375),
        (r"(?i)half[- ]bottle|mezza bottiglia", 0.375),
        (r"(?i)magnum", 1.5),
        (r"(?i)j[eé]roboam", 3.0),
    ]
    .into_iter()
    .map(|(pattern, size)| (Regex::new(pattern).expect("valid regex"), size))
    .collect()
});

/// Turns raw listings into canonical items
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    rate: &'a ExchangeRate,
}

impl<'a> Normalizer<'a> {
    pub fn new(rate: &'a ExchangeRate) -> Self {
        Self { rate }
    }

    /// Normalizes one listing of the given locale, tagging it with the snapshot date
    pub fn normalize(
        &self,
        raw: &RawItemBlock,
        locale: Locale,
        snapshot_date: NaiveDate,
    ) -> Result<Item, ItemParseError> {
        tracing::trace!(
            "Normalizing name: {}, producer: {}, price: {}, awards: {:?}, url: {}",
            raw.name,
            raw.producer,
            raw.price,
            raw.awards,
            raw.url
        );

        let producer = normalize_text(&raw.producer);
        if producer.is_empty() {
            return Err(ItemParseError::MissingField("producer"));
        }

        let (name, bottle_size) = parse_bottle_size(&normalize_text(&raw.name));
        let name = strip_producer_suffix(&name, &producer);
        if name.is_empty() {
            return Err(ItemParseError::MissingField("name"));
        }

        let price = parse_price(&raw.price, self.rate)?;

        Ok(Item {
            name,
            producer,
            bottle_size,
            price,
            url: raw.url.trim().to_string(),
            awarded: !raw.awards.is_empty(),
            locale,
            snapshot_date,
        })
    }
}

/// Folds typographic quotes and dashes to ASCII, lowercases, and trims
/// surrounding whitespace and trailing periods
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            '‘' | '’' | '´' => '\'',
            '“' | '”' => '"',
            '–' | '—' | '‑' | '−' => '-',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();

    trim_title(&folded)
}

fn trim_title(text: &str) -> String {
    text.trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// Parses a storefront price into GBP
///
/// Two formats are understood:
/// - `£12,345.67`: already GBP, comma thousands separator
/// - `12.345,67 €`: EUR, dot thousands separator and decimal comma; converted with `rate`
///
/// The result is rounded to two decimals.
pub fn parse_price(text: &str, rate: &ExchangeRate) -> Result<f64, ItemParseError> {
    let text = text.trim();

    if let Some(amount) = text.strip_prefix('£') {
        let amount = amount.trim().replace(',', "");
        return Ok(round2(parse_amount(&amount, text)?));
    }

    if let Some(amount) = text.strip_suffix('€') {
        let amount = amount.trim().replace('.', "").replace(',', ".");
        return Ok(round2(parse_amount(&amount, text)? * rate.value()));
    }

    Err(ItemParseError::UnknownCurrency(text.to_string()))
}

fn parse_amount(amount: &str, original: &str) -> Result<f64, ItemParseError> {
    let value: f64 = amount
        .parse()
        .map_err(|_| ItemParseError::MalformedPrice(original.to_string()))?;

    if !value.is_finite() || value < 0.0 {
        return Err(ItemParseError::MalformedPrice(original.to_string()));
    }

    Ok(value)
}

/// Extracts the bottle size from a title and removes the marker from it
///
/// Multi-bottle packs win over named sizes. Once a size is found every size
/// marker leaves the title, so a second pass finds none. Titles without any
/// marker are standard 0.75 l bottles and come back unchanged.
pub fn parse_bottle_size(name: &str) -> (String, f64) {
    let count = BOTTLE_COUNT
        .captures(name)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|count| *count > 0);

    let size = match count {
        Some(count) => DEFAULT_BOTTLE_SIZE * f64::from(count),
        None => match SIZE_KEYWORDS.iter().find(|(pattern, _)| pattern.is_match(name)) {
            Some((_, size)) => *size,
            None => return (name.to_string(), DEFAULT_BOTTLE_SIZE),
        },
    };

    (strip_size_markers(name), size)
}

fn strip_size_markers(text: &str) -> String {
    let mut stripped = BOTTLE_COUNT.replace_all(text, " ").into_owned();
    for (pattern, _) in SIZE_KEYWORDS.iter() {
        stripped = pattern.replace_all(&stripped, " ").into_owned();
    }
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    trim_title(&collapsed)
}

/// Cuts the title at a `- producer` or `, producer` suffix
///
/// Both arguments are expected to be normalized already.
pub fn strip_producer_suffix(name: &str, producer: &str) -> String {
    if producer.is_empty() {
        return name.to_string();
    }

    let cut = ['-', ',']
        .iter()
        .filter_map(|sep| name.find(&format!("{} {}", sep, producer)))
        .min();

    match cut {
        Some(index) => trim_title(&name[..index]),
        None => name.to_string(),
    }
}

/// Rounds to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
