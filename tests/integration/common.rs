//! Shared fixtures: listing markup and mock storefront routes

use cellar_gap::config::CrawlerConfig;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const END_OF_RESULTS_ENG: &str = "There are no products matching the selection.";

pub struct Listing<'a> {
    pub title: &'a str,
    pub producer: &'a str,
    pub price: &'a str,
    pub awards: &'a [&'a str],
    pub href: &'a str,
}

pub fn listing_html(listing: &Listing) -> String {
    let awards: String = listing
        .awards
        .iter()
        .map(|award| format!("<li>{}</li>", award))
        .collect();
    format!(
        r#"<article class="productItem">
             <ul class="productItem__awards">{awards}</ul>
             <div class="productItem__info">
               <a href="{href}"><h4 class="productItem__title">{title}</h4></a>
               <p class="productItem__brand">{producer}</p>
               <span class="price">{price}</span>
             </div>
           </article>"#,
        awards = awards,
        href = listing.href,
        title = listing.title,
        producer = listing.producer,
        price = listing.price,
    )
}

pub fn page_html(listings: &[Listing]) -> String {
    let body: String = listings.iter().map(listing_html).collect();
    format!(
        "<html><body><div id=\"js-product-list\">{}</div></body></html>",
        body
    )
}

/// Serves `body` for page `page` of the listing at `route`
pub async fn mount_page(server: &MockServer, route: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("is_ajax_product_list", "true"))
        .and(query_param("p", page.to_string()))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Crawler settings suited to a local mock server
pub fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        request_timeout: Duration::from_secs(5),
        retry_backoff: Duration::ZERO,
        ..CrawlerConfig::default()
    }
}
