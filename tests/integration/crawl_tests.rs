//! Pagination and retry behavior against a live HTTP server

use crate::common::{mount_page, page_html, test_config, Listing, END_OF_RESULTS_ENG};
use cellar_gap::config::{CrawlerConfig, Locale};
use cellar_gap::crawler::{CategoryCrawler, FetchOutcome, HttpPageFetcher, PageFetcher};
use cellar_gap::{CellarError, CrawlState};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn barolo() -> Listing<'static> {
    Listing {
        title: "Barolo 2016",
        producer: "Gaja",
        price: "£95.00",
        awards: &[],
        href: "/en/p/barolo-2016",
    }
}

fn category(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

async fn drain(crawler: &mut CategoryCrawler<'_, HttpPageFetcher>) -> Result<Vec<String>, CellarError> {
    let mut names = Vec::new();
    while let Some(item) = crawler.next_item().await? {
        names.push(item.name);
    }
    Ok(names)
}

#[tokio::test]
async fn test_fetch_page_sends_listing_query() {
    let server = MockServer::start().await;
    mount_page(&server, "/en/red-wines", 3, page_html(&[barolo()])).await;

    let fetcher = HttpPageFetcher::new(&test_config()).unwrap();
    let outcome = fetcher
        .fetch_page(&category(&server, "/en/red-wines"), 3)
        .await;

    match outcome {
        FetchOutcome::Body(body) => assert!(body.contains("Barolo 2016")),
        other => panic!("expected a body, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_page_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/red-wines"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(&test_config()).unwrap();
    let outcome = fetcher
        .fetch_page(&category(&server, "/en/red-wines"), 1)
        .await;
    assert_eq!(outcome, FetchOutcome::HttpStatus(503));
}

#[tokio::test]
async fn test_crawl_until_sentinel() {
    let server = MockServer::start().await;
    mount_page(&server, "/en/red-wines", 1, page_html(&[barolo()])).await;
    mount_page(
        &server,
        "/en/red-wines",
        2,
        page_html(&[Listing {
            title: "Amarone 2015",
            producer: "Quintarelli",
            price: "£310.00",
            awards: &["98 RP"],
            href: "/en/p/amarone-2015",
        }]),
    )
    .await;
    mount_page(
        &server,
        "/en/red-wines",
        3,
        format!("<p>{}</p>", END_OF_RESULTS_ENG),
    )
    .await;

    let config = test_config();
    let fetcher = HttpPageFetcher::new(&config).unwrap();
    let mut crawler = CategoryCrawler::new(
        &fetcher,
        category(&server, "/en/red-wines"),
        Locale::English,
        &config,
    );

    let names = drain(&mut crawler).await.unwrap();
    assert_eq!(names, vec!["Barolo 2016", "Amarone 2015"]);
    assert_eq!(crawler.state(), CrawlState::Exhausted);
    assert_eq!(crawler.pages_fetched(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_unmatched_page_ends_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/it/vini-rossi", 1, page_html(&[barolo()])).await;

    let config = test_config();
    let fetcher = HttpPageFetcher::new(&config).unwrap();
    let mut crawler = CategoryCrawler::new(
        &fetcher,
        category(&server, "/it/vini-rossi"),
        Locale::Italian,
        &config,
    );

    // Page 2 has no mock, so the server answers 404
    assert_eq!(drain(&mut crawler).await.unwrap(), vec!["Barolo 2016"]);
    assert_eq!(crawler.state(), CrawlState::Exhausted);
}

#[tokio::test]
async fn test_timeouts_are_retried_on_same_page() {
    let server = MockServer::start().await;

    // Mounted first, so it answers the first two requests for page 1
    Mock::given(method("GET"))
        .and(path("/en/red-wines"))
        .and(query_param("p", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_html(&[barolo()]))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/en/red-wines", 1, page_html(&[barolo()])).await;
    mount_page(
        &server,
        "/en/red-wines",
        2,
        format!("<p>{}</p>", END_OF_RESULTS_ENG),
    )
    .await;

    let config = CrawlerConfig {
        request_timeout: Duration::from_millis(300),
        ..test_config()
    };
    let fetcher = HttpPageFetcher::new(&config).unwrap();
    let mut crawler = CategoryCrawler::new(
        &fetcher,
        category(&server, "/en/red-wines"),
        Locale::English,
        &config,
    );

    assert_eq!(drain(&mut crawler).await.unwrap(), vec!["Barolo 2016"]);
    assert_eq!(crawler.state(), CrawlState::Exhausted);
}

#[tokio::test]
async fn test_exhausted_timeout_budget_fails_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/red-wines"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_html(&[barolo()]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        request_timeout: Duration::from_millis(200),
        max_timeouts: 1,
        ..test_config()
    };
    let fetcher = HttpPageFetcher::new(&config).unwrap();
    let mut crawler = CategoryCrawler::new(
        &fetcher,
        category(&server, "/en/red-wines"),
        Locale::English,
        &config,
    );

    let err = crawler.next_item().await.unwrap_err();
    assert!(matches!(
        err,
        CellarError::ServerUnavailable { page: 1, timeouts: 2, .. }
    ));
    assert_eq!(crawler.state(), CrawlState::Failed);
    assert!(crawler.next_item().await.unwrap().is_none());
}

#[tokio::test]
async fn test_max_page_stops_crawl() {
    let server = MockServer::start().await;
    for page in 1..=3 {
        mount_page(&server, "/en/red-wines", page, page_html(&[barolo()])).await;
    }

    let config = CrawlerConfig {
        max_page: Some(2),
        ..test_config()
    };
    let fetcher = HttpPageFetcher::new(&config).unwrap();
    let mut crawler = CategoryCrawler::new(
        &fetcher,
        category(&server, "/en/red-wines"),
        Locale::English,
        &config,
    );

    assert_eq!(drain(&mut crawler).await.unwrap().len(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
