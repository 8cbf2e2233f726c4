//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages and tempfile directories
//! for the result and error logs, and run the full crawl cycle end-to-end.

use listing_harvester::config::Config;
use listing_harvester::crawler::{
    build_http_client, run_crawl, Controller, HttpFetcher, PageFetcher, PageResult,
};
use listing_harvester::state::{CrawlOutcome, StopReason};
use listing_harvester::storage::{EntrySink, JsonLinesLog, ListingRecord, LogEntry, LogLevel};
use listing_harvester::url::ListingQuery;
use listing_harvester::HarvestError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_URL: &str = "www.icanvas.com/canvas-art-prints/tag/dogs";
const TEST_AGENT: &str = "HarvesterTest/1.0";

/// Creates a test configuration pointing at the mock server
fn create_test_config(endpoint: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.source.endpoint = endpoint.to_string();
    config.crawler.request_delay_ms = 0;
    config.crawler.retry_backoff_ms = 0;
    config.user_agents.pool = vec![TEST_AGENT.to_string()];
    config.output.result_log_path = dir
        .join("data")
        .join("db_source.log")
        .to_string_lossy()
        .into_owned();
    config.output.error_log_path = dir.join("error.log").to_string_lossy().into_owned();
    config
}

fn listing_page(ids: &[&str]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a class="canvas" href="/canvas-print/item-{}" data-history-target="{}"><img src="/img/{}.jpg"></a>"#,
                id, id, id
            )
        })
        .collect();
    format!(r#"<div class="listing">{}</div>"#, items)
}

/// Mounts a listing page answering for the given `start` offset
async fn mount_page(server: &MockServer, start: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("start", start))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

fn read_entries(path: &str) -> Vec<LogEntry> {
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line should be valid JSON"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn logged_ids(path: &str) -> Vec<String> {
    read_entries(path)
        .iter()
        .filter_map(|e| e.listing_id().map(str::to_string))
        .collect()
}

fn seed_log(path: &str, ids: &[&str]) {
    let mut log = JsonLinesLog::open(path).expect("Failed to open log");
    for id in ids {
        log.append(&LogEntry::info(ListingRecord::new(
            *id,
            format!("/canvas-print/item-{}", id),
        )))
        .expect("Failed to seed log");
    }
}

#[tokio::test]
async fn test_fetcher_sends_listing_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("start", "100"))
        .and(query_param("query", "subject/dogs"))
        .and(query_param("base_query", "subject/dogs"))
        .and(query_param("controller", "list"))
        .and(header("user-agent", TEST_AGENT))
        .and(header_exists("accept"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["1"])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();
    let query = ListingQuery::from_listing_url(LISTING_URL).unwrap();

    let result = fetcher.fetch(&query, 2).await.expect("fetch should succeed");

    match result {
        PageResult::Body(body) => assert!(body.contains(r#"data-history-target="1""#)),
        other => panic!("expected a body, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_classifies_error_status() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();
    let query = ListingQuery::new("style", "renaissance").unwrap();

    let result = fetcher.fetch(&query, 1).await.expect("status is not an Err");
    assert_eq!(result, PageResult::Failure(429));
}

#[tokio::test]
async fn test_fetcher_network_error() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1/", dir.path());

    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();
    let query = ListingQuery::new("style", "renaissance").unwrap();

    let result = fetcher.fetch(&query, 1).await;
    assert!(matches!(result, Err(HarvestError::Network { .. })));
}

#[tokio::test]
async fn test_full_crawl_records_first_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    mount_page(&server, "50", &["101", "102", "103", "104", "105"]).await;
    mount_page(&server, "100", &[]).await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Stopped(StopReason::Exhausted)
    ));
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_appended, 5);

    let entries = read_entries(&config.output.result_log_path);
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e.level == LogLevel::Info));
    assert!(entries.iter().all(|e| e.timestamp.is_some()));
    assert_eq!(
        logged_ids(&config.output.result_log_path),
        vec!["101", "102", "103", "104", "105"]
    );
    assert!(read_entries(&config.output.error_log_path).is_empty());
}

#[tokio::test]
async fn test_rerun_appends_only_new_records() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    seed_log(&config.output.result_log_path, &["101", "103", "105"]);

    mount_page(&server, "50", &["101", "102", "103", "104", "105"]).await;
    mount_page(&server, "100", &[]).await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert_eq!(report.known_before, 3);
    assert_eq!(report.records_appended, 2);
    assert_eq!(
        logged_ids(&config.output.result_log_path),
        vec!["101", "103", "105", "102", "104"]
    );
}

#[tokio::test]
async fn test_crawl_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    mount_page(&server, "50", &["1", "2", "3"]).await;
    mount_page(&server, "100", &["4", "5"]).await;
    mount_page(&server, "150", &[]).await;

    let first = run_crawl(&config, LISTING_URL).await.expect("First crawl failed");
    let second = run_crawl(&config, LISTING_URL).await.expect("Second crawl failed");

    assert_eq!(first.records_appended, 5);
    assert_eq!(second.records_appended, 0);
    assert_eq!(second.known_before, 5);

    let ids = logged_ids(&config.output.result_log_path);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(unique.len(), 5);
}

#[tokio::test]
async fn test_aborts_after_retry_budget() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Aborted(HarvestError::FetchFailed {
            status: 500,
            attempts: 3,
            ..
        })
    ));
    assert_eq!(report.fetch_attempts, 3);

    let errors = read_entries(&config.output.error_log_path);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, LogLevel::Error);
    assert!(logged_ids(&config.output.result_log_path).is_empty());
}

#[tokio::test]
async fn test_recovers_from_transient_error_status() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());

    // Mounted first, so it answers the first request and then steps aside
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("start", "50"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "50", &["7", "8"]).await;
    mount_page(&server, "100", &[]).await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert_eq!(report.outcome.phase(), listing_harvester::CrawlPhase::Stopped);
    assert_eq!(report.fetch_attempts, 3);
    assert_eq!(logged_ids(&config.output.result_log_path), vec!["7", "8"]);
}

#[tokio::test]
async fn test_network_failure_aborts_immediately() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1/", dir.path());

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Aborted(HarvestError::Network { .. })
    ));
    assert_eq!(report.fetch_attempts, 1);
    assert_eq!(read_entries(&config.output.error_log_path).len(), 1);
}

#[tokio::test]
async fn test_page_limit_stops_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.crawler.max_pages = Some(2);

    mount_page(&server, "50", &["1"]).await;
    mount_page(&server, "100", &["2"]).await;
    Mock::given(method("GET"))
        .and(query_param("start", "150"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["3"])))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Stopped(StopReason::PageLimit)
    ));
    assert_eq!(logged_ids(&config.output.result_log_path), vec!["1", "2"]);
}

#[tokio::test]
async fn test_session_bootstrap_runs_before_listing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.source.bootstrap_url = Some(format!("{}/home", server.uri()));

    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "50", &[]).await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Stopped(StopReason::Exhausted)
    ));
}

#[tokio::test]
async fn test_session_failure_aborts_before_fetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.source.bootstrap_url = Some(format!("{}/home", server.uri()));

    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["1"])))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(&config, LISTING_URL).await.expect("Crawl failed");

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Aborted(HarvestError::Navigation { .. })
    ));
    assert_eq!(report.fetch_attempts, 0);
    assert_eq!(read_entries(&config.output.error_log_path).len(), 1);
}

#[tokio::test]
async fn test_replay_skips_malformed_lines() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1/", dir.path());
    let log_path = Path::new(&config.output.result_log_path);
    fs::create_dir_all(log_path.parent().unwrap()).unwrap();

    let mut lines = Vec::new();
    for id in 1..=4 {
        lines.push(format!(
            r#"{{"level":"info","message":{{"productId":"{}","url":"/p/{}"}},"timestamp":"2024-05-01T10:00:00Z"}}"#,
            id, id
        ));
        lines.push(format!(r#"{{"level":"info","message":{{"productId":"{}""#, id));
    }
    lines.push("%%% not json %%%".to_string());
    fs::write(log_path, lines.join("\n")).unwrap();

    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();
    let results = JsonLinesLog::open(log_path).unwrap();
    let errors = JsonLinesLog::open(&config.output.error_log_path).unwrap();

    let controller =
        Controller::from_log(config.crawler.clone(), fetcher, results, errors).unwrap();

    assert_eq!(controller.dedup().len(), 4);
    for id in ["1", "2", "3", "4"] {
        assert!(controller.dedup().has(id));
    }
}

#[tokio::test]
async fn test_invalid_listing_url_is_a_setup_error() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1/", dir.path());

    let result = run_crawl(&config, "www.icanvas.com/").await;

    assert!(matches!(result, Err(HarvestError::Url(_))));
    assert!(!Path::new(&config.output.result_log_path).exists());
}
