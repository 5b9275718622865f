//! End-to-end: locale documents, ingestion of both storefronts, comparison
//! and the CSV report

use crate::common::{mount_page, page_html, test_config, Listing, END_OF_RESULTS_ENG};
use cellar_gap::config::{load_locale_config_with_hash, ExchangeRate, Locale};
use cellar_gap::crawler::{ingest, LocaleSource};
use cellar_gap::output::{compare, write_report, ComparisonRequest};
use cellar_gap::storage::{RunStatus, SqliteStorage, Storage};
use cellar_gap::CellarError;
use chrono::NaiveDate;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

async fn mount_english_store(server: &MockServer) {
    mount_page(
        server,
        "/en/red-wines",
        1,
        page_html(&[
            Listing {
                title: "Barolo 2016 - Gaja",
                producer: "Gaja",
                price: "£99.00",
                awards: &[],
                href: "/en/p/barolo-2016-a",
            },
            Listing {
                title: "Barolo 2016",
                producer: "Gaja",
                price: "£95.00",
                awards: &[],
                href: "/en/p/barolo-2016-b",
            },
            Listing {
                title: "Christmas Charity Box",
                producer: "Various",
                price: "£50.00",
                awards: &[],
                href: "/en/p/charity",
            },
        ]),
    )
    .await;
    mount_page(
        server,
        "/en/red-wines",
        2,
        page_html(&[
            Listing {
                title: "Tignanello Magnum",
                producer: "Antinori",
                price: "£200.00",
                awards: &[],
                href: "/en/p/tignanello-magnum",
            },
            Listing {
                title: "Sassicaia 2017",
                producer: "Tenuta San Guido",
                price: "£250.00",
                awards: &[],
                href: "/en/p/sassicaia-2017",
            },
        ]),
    )
    .await;
    mount_page(
        server,
        "/en/red-wines",
        3,
        format!("<p>{}</p>", END_OF_RESULTS_ENG),
    )
    .await;
}

async fn mount_italian_store(server: &MockServer) {
    mount_page(
        server,
        "/it/vini-rossi",
        1,
        page_html(&[
            Listing {
                title: "Barolo 2016",
                producer: "Gaja",
                price: "100,00 €",
                awards: &["97 WS"],
                href: "/it/p/barolo-2016",
            },
            Listing {
                title: "Tignanello Magnum",
                producer: "Antinori",
                price: "250,00 €",
                awards: &[],
                href: "/it/p/tignanello-magnum",
            },
            Listing {
                title: "Brunello 2015",
                producer: "Biondi Santi",
                price: "prezzo su richiesta",
                awards: &[],
                href: "/it/p/brunello",
            },
        ]),
    )
    .await;
    // Page 2 is unmocked and answers 404, which ends the listing
}

fn write_locale_document(dir: &Path, name: &str, server: &MockServer, route: &str) -> LocaleSourceFile {
    let path = dir.join(name);
    std::fs::write(
        &path,
        format!("categories = [\"{}{}\"]\n", server.uri(), route),
    )
    .unwrap();
    LocaleSourceFile(path)
}

struct LocaleSourceFile(std::path::PathBuf);

impl LocaleSourceFile {
    fn load(&self, locale: Locale) -> LocaleSource {
        let (config, config_hash) = load_locale_config_with_hash(&self.0).unwrap();
        LocaleSource {
            locale,
            config,
            config_hash,
        }
    }
}

#[tokio::test]
async fn test_full_pipeline_writes_report() {
    let server = MockServer::start().await;
    mount_english_store(&server).await;
    mount_italian_store(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let eng = write_locale_document(dir.path(), "eng.toml", &server, "/en/red-wines");
    let ita = write_locale_document(dir.path(), "ita.toml", &server, "/it/vini-rossi");
    let sources = vec![ita.load(Locale::Italian), eng.load(Locale::English)];

    let mut storage = SqliteStorage::new(&dir.path().join("cellar.db")).unwrap();
    let config = test_config();
    let rate = ExchangeRate::new(0.86).unwrap();

    let summary = ingest(&mut storage, &sources, &config, &rate, date())
        .await
        .unwrap();
    assert_eq!(summary.categories.len(), 2);
    assert_eq!(summary.inserted(), 5);

    assert_eq!(storage.count_items(Locale::English, date()).unwrap(), 3);
    assert_eq!(storage.count_items(Locale::Italian, date()).unwrap(), 2);

    let request = ComparisonRequest {
        preferred: Locale::English,
        compare: Locale::Italian,
        snapshot_date: date(),
        max_diff: 10.0,
    };
    let rows = compare(&storage, &request).unwrap();
    assert_eq!(rows.len(), 2);

    let out = dir.path().join("output.csv");
    write_report(&out, request.preferred, request.compare, &rows).unwrap();

    let base = server.uri();
    let expected = format!(
        "name,producer,bottle_size,price_ita,price_eng,diff,awards,url_ita,url_eng\n\
         tignanello,antinori,1.5,215.00,200.00,-15.00,false,{base}/it/p/tignanello-magnum,{base}/en/p/tignanello-magnum\n\
         barolo 2016,gaja,0.75,86.00,95.00,9.00,true,{base}/it/p/barolo-2016,{base}/en/p/barolo-2016-b\n",
        base = base
    );
    assert_eq!(std::fs::read_to_string(&out).unwrap(), expected);
}

#[tokio::test]
async fn test_threshold_excludes_expensive_gaps() {
    let server = MockServer::start().await;
    mount_english_store(&server).await;
    mount_italian_store(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let eng = write_locale_document(dir.path(), "eng.toml", &server, "/en/red-wines");
    let ita = write_locale_document(dir.path(), "ita.toml", &server, "/it/vini-rossi");

    let mut storage = SqliteStorage::new(&dir.path().join("cellar.db")).unwrap();
    let rate = ExchangeRate::new(0.86).unwrap();
    ingest(
        &mut storage,
        &[eng.load(Locale::English), ita.load(Locale::Italian)],
        &test_config(),
        &rate,
        date(),
    )
    .await
    .unwrap();

    let rows = compare(
        &storage,
        &ComparisonRequest {
            preferred: Locale::English,
            compare: Locale::Italian,
            snapshot_date: date(),
            max_diff: 0.0,
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "tignanello");

    // Swapping the roles flips the sign of every gap
    let rows = compare(
        &storage,
        &ComparisonRequest {
            preferred: Locale::Italian,
            compare: Locale::English,
            snapshot_date: date(),
            max_diff: 0.0,
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "barolo 2016");
    assert_eq!(rows[0].diff, -9.0);
}

#[tokio::test]
async fn test_rerun_same_day_keeps_first_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cellar.db");
    let rate = ExchangeRate::default();

    let first = MockServer::start().await;
    mount_english_store(&first).await;
    let eng = write_locale_document(dir.path(), "eng.toml", &first, "/en/red-wines");
    {
        let mut storage = SqliteStorage::new(&db).unwrap();
        ingest(&mut storage, &[eng.load(Locale::English)], &test_config(), &rate, date())
            .await
            .unwrap();
    }

    // Same storefront, new prices
    let second = MockServer::start().await;
    mount_page(
        &second,
        "/en/red-wines",
        1,
        page_html(&[Listing {
            title: "Barolo 2016",
            producer: "Gaja",
            price: "£10.00",
            awards: &[],
            href: "/en/p/barolo-cheap",
        }]),
    )
    .await;
    let eng = write_locale_document(dir.path(), "eng.toml", &second, "/en/red-wines");

    let mut storage = SqliteStorage::new(&db).unwrap();
    let summary = ingest(&mut storage, &[eng.load(Locale::English)], &test_config(), &rate, date())
        .await
        .unwrap();
    assert_eq!(summary.inserted(), 0);
    assert_eq!(summary.already_present(), 1);

    let barolo = storage
        .items_for(Locale::English, date())
        .unwrap()
        .into_iter()
        .find(|item| item.name == "barolo 2016")
        .unwrap();
    assert_eq!(barolo.price, 95.0);
}

#[tokio::test]
async fn test_failing_category_surfaces_error_and_marks_run() {
    let server = MockServer::start().await;
    mount_english_store(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let eng = write_locale_document(dir.path(), "eng.toml", &server, "/en/red-wines");
    // Nothing listens on port 9
    std::fs::write(
        dir.path().join("ita.toml"),
        "categories = [\"http://127.0.0.1:9/it/vini-rossi\"]\n",
    )
    .unwrap();
    let ita = LocaleSourceFile(dir.path().join("ita.toml"));

    let mut storage = SqliteStorage::new(&dir.path().join("cellar.db")).unwrap();
    let result = ingest(
        &mut storage,
        &[eng.load(Locale::English), ita.load(Locale::Italian)],
        &test_config(),
        &ExchangeRate::default(),
        date(),
    )
    .await;
    assert!(matches!(result, Err(CellarError::Transport { page: 1, .. })));

    // The English category completed before the failure
    assert_eq!(storage.count_items(Locale::English, date()).unwrap(), 3);

    let runs = storage.recent_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].locale, Locale::Italian);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert_eq!(runs[1].status, RunStatus::Completed);
    assert_eq!(runs[1].items_stored, 3);
}

#[tokio::test]
async fn test_status_error_on_first_page_yields_empty_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/red-wines"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let eng = write_locale_document(dir.path(), "eng.toml", &server, "/en/red-wines");
    let mut storage = SqliteStorage::new(&dir.path().join("cellar.db")).unwrap();

    let summary = ingest(
        &mut storage,
        &[eng.load(Locale::English)],
        &test_config(),
        &ExchangeRate::default(),
        date(),
    )
    .await
    .unwrap();
    assert_eq!(summary.inserted(), 0);
    assert_eq!(summary.categories[0].1.pages_fetched, 0);
}
