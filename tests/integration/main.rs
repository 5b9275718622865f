//! Integration tests for Cellar-Gap
//!
//! These tests use wiremock to serve storefront listings and run the
//! ingestion and comparison end-to-end against a temporary database.

mod common;
mod crawl_tests;
mod pipeline_tests;
