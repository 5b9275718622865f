//! Configuration module for Cellar-Gap
//!
//! This module handles locale documents (the category listings to crawl),
//! crawler tuning and the exchange rate used to bring EUR prices into GBP.
//!
//! # Example
//!
//! ```no_run
//! use cellar_gap::config::load_locale_config;
//! use std::path::Path;
//!
//! let config = load_locale_config(Path::new("ita.json")).unwrap();
//! println!("Crawling {} categories", config.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlerConfig, ExchangeRate, Locale, LocaleConfig, DEFAULT_EUR_TO_GBP, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_locale_config, load_locale_config_with_hash};
pub use validation::validate_crawler_config;
