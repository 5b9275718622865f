//! Cellar-Gap: cross-locale price comparison for a bilingual wine storefront
//!
//! This crate crawls the paginated category listings of two localized
//! storefronts, normalizes every listing into a canonical [`catalog::Item`],
//! persists one snapshot per locale and day, and reports the items whose
//! price gap between the two locales stays under a threshold.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Cellar-Gap operations
#[derive(Debug, Error)]
pub enum CellarError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server unavailable for {url}: page {page} timed out {timeouts} times")]
    ServerUnavailable { url: String, page: u32, timeouts: u32 },

    #[error("Transport error for {url} page {page}: {message}")]
    Transport {
        url: String,
        page: u32,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Report error: {0}")]
    Report(#[from] output::ReportError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid crawl transition: {event:?} in state {from:?}")]
    InvalidTransition {
        from: state::CrawlState,
        event: state::CrawlEvent,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),
}

/// Result type alias for Cellar-Gap operations
pub type Result<T> = std::result::Result<T, CellarError>;

// Re-export commonly used types
pub use catalog::{Catalog, Item, ItemKey, Normalizer, RawItemBlock};
pub use config::{CrawlerConfig, ExchangeRate, Locale, LocaleConfig};
pub use state::CrawlState;
