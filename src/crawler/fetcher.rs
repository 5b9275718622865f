//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with a browser-like user agent
//! - Requesting one page of a category listing
//! - Classifying transport failures into typed outcomes

use crate::config::CrawlerConfig;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Result of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server answered 2xx with this body
    Body(String),

    /// The server answered with a non-success status
    HttpStatus(u16),

    /// The request timed out (connect or read)
    Timeout,

    /// Any other transport failure (connection refused, TLS, DNS, ...)
    Transport(String),
}

/// Source of category listing pages
///
/// The crawler only talks to this trait, which keeps the pagination logic
/// independent of the HTTP stack.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Requests page `page` (1-based) of the listing at `category`
    async fn fetch_page(&self, category: &Url, page: u32) -> FetchOutcome;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use cellar_gap::config::CrawlerConfig;
/// use cellar_gap::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    /// Sends `GET <category>?is_ajax_product_list=true&p=<page>`
    ///
    /// # Outcome Mapping
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | HTTP 2xx | Body |
    /// | Any other status | HttpStatus |
    /// | Timeout while connecting or reading | Timeout |
    /// | Any other transport error | Transport |
    async fn fetch_page(&self, category: &Url, page: u32) -> FetchOutcome {
        tracing::info!("Requesting {} page {}", category, page);

        let request = self.client.get(category.clone()).query(&[
            ("is_ajax_product_list", "true".to_string()),
            ("p", page.to_string()),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_error(e, category, page),
        };

        let status = response.status();
        tracing::debug!(
            "Request to {} returned status {}",
            response.url(),
            status.as_u16()
        );

        if !status.is_success() {
            return FetchOutcome::HttpStatus(status.as_u16());
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Body(body),
            Err(e) => classify_error(e, category, page),
        }
    }
}

fn classify_error(error: reqwest::Error, category: &Url, page: u32) -> FetchOutcome {
    if error.is_timeout() {
        tracing::warn!("Timeout received on {} page {}", category, page);
        FetchOutcome::Timeout
    } else {
        tracing::warn!("Transport error on {} page {}: {}", category, page, error);
        FetchOutcome::Transport(error.to_string())
    }
}
