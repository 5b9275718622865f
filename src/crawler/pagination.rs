//! Pagination over one category listing
//!
//! `CategoryCrawler` walks a listing page by page. Each step fetches and
//! parses one page into a `PageOutcome`, and the outcome drives the
//! `CrawlState` machine. Pages are strictly sequential: whether page N+1 is
//! requested depends on what page N returned.
//!
//! The crawler is a pull-based, forward-only sequence with a single consumer.
//! Once it reaches a terminal state it only ever yields `None`; it cannot be
//! restarted.

use crate::catalog::RawItemBlock;
use crate::config::{CrawlerConfig, Locale};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::parser::ItemExtractor;
use crate::state::{CrawlEvent, CrawlState};
use crate::CellarError;
use std::collections::VecDeque;
use url::Url;

/// Result of one fetch-and-parse step
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The page listed these items (possibly none after exclusions)
    Items(Vec<RawItemBlock>),

    /// The listing is over: sentinel, no listing blocks, or an HTTP error status
    EndOfResults,

    /// The request timed out and may be repeated
    Retryable,

    /// The request failed in a way retrying will not fix
    Fatal(String),
}

/// Walks the pages of one category listing
pub struct CategoryCrawler<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    category: Url,
    extractor: ItemExtractor,
    config: &'a CrawlerConfig,
    state: CrawlState,
    buffer: VecDeque<RawItemBlock>,
    pages_fetched: u32,
}

impl<'a, F: PageFetcher + ?Sized> CategoryCrawler<'a, F> {
    /// Creates a crawler positioned on page 1 of `category`
    pub fn new(fetcher: &'a F, category: Url, locale: Locale, config: &'a CrawlerConfig) -> Self {
        Self {
            fetcher,
            category,
            extractor: ItemExtractor::new(locale, config.excluded_names.clone()),
            config,
            state: CrawlState::start(),
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn category(&self) -> &Url {
        &self.category
    }

    /// Number of listing pages parsed so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Fetches and parses one page, without touching the crawl state
    ///
    /// # Outcome Mapping
    ///
    /// | Fetch result | Outcome |
    /// |--------------|---------|
    /// | Body with listings | Items |
    /// | Body with sentinel or no listings | EndOfResults |
    /// | Non-2xx status | EndOfResults |
    /// | Timeout | Retryable |
    /// | Other transport error | Fatal |
    pub async fn fetch_step(&self, page: u32) -> PageOutcome {
        match self.fetcher.fetch_page(&self.category, page).await {
            FetchOutcome::Body(body) => match self.extractor.extract(&body, &self.category) {
                Ok(items) => PageOutcome::Items(items),
                Err(reason) => {
                    tracing::debug!("{} page {}: {}", self.category, page, reason);
                    PageOutcome::EndOfResults
                }
            },
            FetchOutcome::HttpStatus(status) => {
                tracing::info!(
                    "{} page {} returned HTTP {}, treating as end of results",
                    self.category,
                    page,
                    status
                );
                PageOutcome::EndOfResults
            }
            FetchOutcome::Timeout => PageOutcome::Retryable,
            FetchOutcome::Transport(message) => PageOutcome::Fatal(message),
        }
    }

    /// Returns the items of the next page that has any
    ///
    /// # Returns
    ///
    /// * `Ok(Some(items))` - The next page's items
    /// * `Ok(None)` - The listing is over (or the crawl already failed)
    /// * `Err(CellarError)` - The crawl failed on this call; the category is abandoned
    pub async fn next_page(&mut self) -> Result<Option<Vec<RawItemBlock>>, CellarError> {
        loop {
            let page = match self.state.page() {
                Some(page) => page,
                None => return Ok(None),
            };

            let backoff = self.config.backoff_for(self.state.timeouts());
            if !backoff.is_zero() {
                tracing::debug!("Waiting {:?} before retrying page {}", backoff, page);
                tokio::time::sleep(backoff).await;
            }

            match self.fetch_step(page).await {
                PageOutcome::Items(items) => {
                    self.advance(CrawlEvent::PageParsed)?;
                    self.pages_fetched += 1;
                    tracing::debug!(
                        "{} page {} yielded {} items",
                        self.category,
                        page,
                        items.len()
                    );
                    if self.state.is_terminal() {
                        tracing::info!(
                            "Reached max page {} for {}",
                            page,
                            self.category
                        );
                    }
                    return Ok(Some(items));
                }
                PageOutcome::EndOfResults => {
                    self.advance(CrawlEvent::EndOfResults)?;
                    tracing::info!("{} ended at page {}", self.category, page);
                    return Ok(None);
                }
                PageOutcome::Retryable => {
                    let timeouts = self.state.timeouts() + 1;
                    self.advance(CrawlEvent::TimedOut)?;
                    if self.state == CrawlState::Failed {
                        tracing::error!(
                            "{} page {} timed out {} times, giving up",
                            self.category,
                            page,
                            timeouts
                        );
                        return Err(CellarError::ServerUnavailable {
                            url: self.category.to_string(),
                            page,
                            timeouts,
                        });
                    }
                    tracing::warn!(
                        "{} page {} timed out ({}/{}), retrying",
                        self.category,
                        page,
                        timeouts,
                        self.config.max_timeouts
                    );
                }
                PageOutcome::Fatal(message) => {
                    self.advance(CrawlEvent::Fatal)?;
                    return Err(CellarError::Transport {
                        url: self.category.to_string(),
                        page,
                        message,
                    });
                }
            }
        }
    }

    /// Returns the next raw listing of the category
    ///
    /// Pages are requested lazily, only once the previous page's listings
    /// have all been consumed.
    pub async fn next_item(&mut self) -> Result<Option<RawItemBlock>, CellarError> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }

            match self.next_page().await? {
                Some(items) => self.buffer.extend(items),
                None => return Ok(None),
            }
        }
    }

    fn advance(&mut self, event: CrawlEvent) -> Result<(), CellarError> {
        self.state = self
            .state
            .on_event(event, self.config.max_page, self.config.max_timeouts)?;
        Ok(())
    }
}
