//! State module for tracking pagination progress
//!
//! A category listing is walked page by page; `CrawlState` records where the
//! walk is and whether it is over.
//!
//! # Components
//!
//! - `CrawlState`: the pagination state machine (fetching, retrying, exhausted, failed)
//! - `CrawlEvent`: what a single fetch-and-parse step reported

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlEvent, CrawlState};
