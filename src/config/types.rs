use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Browser-like user agent; the storefront serves the AJAX listing only to browsers
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_3) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.149 Safari/537.36";

/// Default EUR to GBP rate used when nothing else is configured
pub const DEFAULT_EUR_TO_GBP: f64 = 0.86;

/// One of the two localized storefronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locale {
    /// English storefront, priced in GBP
    English,

    /// Italian storefront, priced in EUR
    Italian,
}

impl Locale {
    /// Both locales, in a stable order
    pub const ALL: [Locale; 2] = [Locale::English, Locale::Italian];

    /// Short code used in the database, the report header and the CLI
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Italian => "ita",
        }
    }

    /// Parses a locale from its short code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "eng" => Some(Self::English),
            "ita" => Some(Self::Italian),
            _ => None,
        }
    }

    /// Phrase the storefront renders once the listing runs past its last page
    pub fn end_of_results_sentinel(&self) -> &'static str {
        match self {
            Self::English => "There are no products matching the selection",
            Self::Italian => "Non ci sono prodotti corrispondenti alla selezione",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| ConfigError::UnknownLocale(s.to_string()))
    }
}

/// Per-locale document listing the category listings to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Base URLs of the category listings
    pub categories: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Consecutive timeouts tolerated on one page before the category is abandoned
    pub max_timeouts: u32,

    /// Last page to request per category (`None` crawls until the listing ends)
    pub max_page: Option<u32>,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Delay before the first retry of a timed-out page; doubles per retry
    pub retry_backoff: Duration,

    /// Upper bound for the retry delay
    pub max_retry_backoff: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Listings whose title contains any of these are skipped (bundles, charity boxes)
    pub excluded_names: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_timeouts: 3,
            max_page: None,
            request_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_millis(500),
            max_retry_backoff: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            excluded_names: vec!["Charity Box".to_string(), "bottiglie + libro".to_string()],
        }
    }
}

impl CrawlerConfig {
    /// Delay to wait before retrying after the given number of consecutive timeouts
    pub fn backoff_for(&self, timeouts: u32) -> Duration {
        if timeouts == 0 || self.retry_backoff.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32 << (timeouts - 1).min(16);
        self.retry_backoff
            .saturating_mul(factor)
            .min(self.max_retry_backoff)
    }
}

/// EUR to reference-currency (GBP) multiplier
///
/// Built once at startup and handed to the normalizer; every EUR price is
/// converted with it so both locales compare in the same currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    /// Creates a rate, rejecting zero, negative and non-finite values
    pub fn new(rate: f64) -> Result<Self, ConfigError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "exchange rate must be a positive number, got {}",
                rate
            )));
        }
        Ok(Self(rate))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self(DEFAULT_EUR_TO_GBP)
    }
}
