//! HTML parser for category listing pages
//!
//! This module extracts the raw fields of every product listed on one page:
//! - title, producer and detail link from the listing's info block
//! - the discounted price when present, the standard price otherwise
//! - the award markers attached to the listing
//!
//! A broken listing is logged and skipped; it never invalidates the page.

use crate::catalog::RawItemBlock;
use crate::config::Locale;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Why a page carries no listings
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvalidPage {
    #[error("page contains the end-of-results sentinel")]
    EndOfResults,

    #[error("page contains no product listings")]
    NoItems,
}

/// Why a single listing could not be extracted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing element: {0}")]
    MissingElement(&'static str),

    #[error("invalid detail link '{0}'")]
    InvalidUrl(String),
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static PRODUCT: Lazy<Selector> = Lazy::new(|| selector("article.productItem"));
static INFO: Lazy<Selector> = Lazy::new(|| selector("div.productItem__info"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h4.productItem__title"));
static BRAND: Lazy<Selector> = Lazy::new(|| selector("p.productItem__brand"));
static NEW_PRICE: Lazy<Selector> = Lazy::new(|| selector("span.new-price"));
static PRICE: Lazy<Selector> = Lazy::new(|| selector("span.price"));
static AWARDS: Lazy<Selector> = Lazy::new(|| selector("ul.productItem__awards li"));

/// Extracts raw listings from category pages of one locale
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    locale: Locale,
    excluded_names: Vec<String>,
}

impl ItemExtractor {
    /// Creates an extractor skipping every listing whose title contains one of `excluded_names`
    pub fn new(locale: Locale, excluded_names: Vec<String>) -> Self {
        Self {
            locale,
            excluded_names,
        }
    }

    /// Parses a page body into raw listings
    ///
    /// # Arguments
    ///
    /// * `body` - The page HTML
    /// * `base_url` - The category URL, for resolving relative detail links
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<RawItemBlock>)` - The listings that could be extracted (possibly none
    ///   if every listing was excluded or broken)
    /// * `Err(InvalidPage)` - The page marks the end of the listing
    ///
    /// # Example
    ///
    /// ```
    /// use cellar_gap::config::Locale;
    /// use cellar_gap::crawler::{InvalidPage, ItemExtractor};
    /// use url::Url;
    ///
    /// let extractor = ItemExtractor::new(Locale::English, vec![]);
    /// let base = Url::parse("https://shop.example.com/en/red-wines").unwrap();
    /// let body = "<p>There are no products matching the selection.</p>";
    /// assert_eq!(extractor.extract(body, &base), Err(InvalidPage::EndOfResults));
    /// ```
    pub fn extract(&self, body: &str, base_url: &Url) -> Result<Vec<RawItemBlock>, InvalidPage> {
        if self.is_end_of_results(body) {
            return Err(InvalidPage::EndOfResults);
        }

        let document = Html::parse_document(body);
        let blocks: Vec<ElementRef> = document.select(&PRODUCT).collect();
        if blocks.is_empty() {
            return Err(InvalidPage::NoItems);
        }

        let mut items = Vec::with_capacity(blocks.len());
        for block in blocks {
            match self.extract_block(block, base_url) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "Error ({}) parsing {} listing {}, skip",
                        e,
                        self.locale,
                        snippet(&block.html())
                    );
                }
            }
        }

        Ok(items)
    }

    /// The sentinel of every locale is honored; empty pages are sometimes
    /// rendered in the other language
    fn is_end_of_results(&self, body: &str) -> bool {
        Locale::ALL
            .iter()
            .any(|locale| body.contains(locale.end_of_results_sentinel()))
    }

    /// Extracts one listing; `Ok(None)` means the listing is excluded by name
    fn extract_block(
        &self,
        block: ElementRef,
        base_url: &Url,
    ) -> Result<Option<RawItemBlock>, ExtractError> {
        let info = block
            .select(&INFO)
            .next()
            .ok_or(ExtractError::MissingElement("info"))?;

        let href = info
            .select(&LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .ok_or(ExtractError::MissingElement("link"))?;

        let name = first_text(info, &TITLE).ok_or(ExtractError::MissingElement("title"))?;
        if self
            .excluded_names
            .iter()
            .any(|excluded| name.contains(excluded.as_str()))
        {
            tracing::debug!("Skipping excluded listing '{}'", name);
            return Ok(None);
        }

        let producer = first_text(info, &BRAND).ok_or(ExtractError::MissingElement("brand"))?;

        let price = first_text(info, &NEW_PRICE)
            .or_else(|| first_text(info, &PRICE))
            .ok_or(ExtractError::MissingElement("price"))?;

        let awards = block.select(&AWARDS).map(element_text).collect();

        let url = base_url
            .join(href.trim())
            .map_err(|_| ExtractError::InvalidUrl(href.to_string()))?;

        Ok(Some(RawItemBlock {
            name,
            price,
            producer,
            awards,
            url: url.to_string(),
        }))
    }
}

/// Text of the first match of `selector` under `element`, if non-blank
fn first_text(element: ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Element text with whitespace runs collapsed
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn snippet(html: &str) -> String {
    const MAX: usize = 200;
    match html.char_indices().nth(MAX) {
        Some((index, _)) => format!("{}...", &html[..index]),
        None => html.to_string(),
    }
}
