//! Integration tests for the calendar client over real HTTP
//!
//! Runs `LhuClient` and `ScheduleRetriever` against a local stub server to
//! check error mapping and that failures never reach the cache.

mod common;

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use common::{closed_port_url, Reply, StubServer, SCHEDULE_BODY};
use lhu_calendar::cache::CacheManager;
use lhu_calendar::{CleanupPolicy, FetchError, LhuClient, Query, ScheduleRetriever};

const STUDENT: &str = "123456";

fn query() -> Query {
    let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
    Query::new(start, 4)
}

fn retriever_for(url: &str, timeout: Duration) -> (ScheduleRetriever<LhuClient>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cache = CacheManager::with_dir(temp_dir.path().to_path_buf(), 24);
    let client = LhuClient::new(url, STUDENT).with_timeout(timeout);
    let retriever = ScheduleRetriever::new(client, Some(cache)).with_cleanup(CleanupPolicy::Never);
    (retriever, temp_dir)
}

fn cached_files(dir: &TempDir) -> usize {
    fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_successful_fetch_parses_rows_and_sends_form_body() {
    let server = StubServer::start(Reply::Json(SCHEDULE_BODY.to_string()));
    let client = LhuClient::new(server.url.as_str(), STUDENT);

    let entries = client
        .fetch_schedule(query().query_time())
        .await
        .expect("Fetch should succeed");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].subject_name(), "Lập trình mạng");
    assert_eq!(entries[1].room_name(), "B.105");
    assert_eq!(
        entries[1].start_time(),
        Utc.with_ymd_and_hms(2025, 3, 4, 13, 0, 0).unwrap()
    );

    let bodies = server.bodies();
    assert_eq!(bodies.len(), 1);
    let sent: HashMap<String, String> =
        url::form_urlencoded::parse(bodies[0].as_bytes()).into_owned().collect();
    assert_eq!(sent["StudentID"], STUDENT);
    assert_eq!(sent["Ngay"], "2025-03-03 00:00:00+00:00");
    assert_eq!(sent["PageIndex"], "1");
    assert_eq!(sent["PageSize"], "30");
}

#[tokio::test]
async fn test_server_error_maps_to_fetch_failed() {
    let server = StubServer::start(Reply::Status(500, "Internal Server Error"));
    let client = LhuClient::new(server.url.as_str(), STUDENT);

    let err = client.fetch_schedule(query().query_time()).await.unwrap_err();

    assert!(matches!(err, FetchError::FetchFailed { status: Some(500), .. }), "{:?}", err);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_malformed_body_maps_to_fetch_failed() {
    let server = StubServer::start(Reply::Json(r#"{"data": "nope"}"#.to_string()));
    let client = LhuClient::new(server.url.as_str(), STUDENT);

    let err = client.fetch_schedule(query().query_time()).await.unwrap_err();

    assert!(matches!(err, FetchError::FetchFailed { status: Some(200), .. }), "{:?}", err);
    assert!(err.to_string().contains("malformed response"));
}

#[tokio::test]
async fn test_slow_server_maps_to_request_timeout() {
    let server = StubServer::start(Reply::Hang(Duration::from_secs(3)));
    let client = LhuClient::new(server.url.as_str(), STUDENT).with_timeout(Duration::from_millis(200));

    let err = client.fetch_schedule(query().query_time()).await.unwrap_err();

    assert!(matches!(err, FetchError::RequestTimeout(_)), "{:?}", err);
}

#[tokio::test]
async fn test_refused_connection_maps_to_connection_failure() {
    let client = LhuClient::new(closed_port_url(), STUDENT);

    let err = client.fetch_schedule(query().query_time()).await.unwrap_err();

    assert!(matches!(err, FetchError::ConnectionFailure(_)), "{:?}", err);
}

#[tokio::test]
async fn test_retriever_serves_repeat_queries_from_cache() {
    let server = StubServer::start(Reply::Json(SCHEDULE_BODY.to_string()));
    let (retriever, temp_dir) = retriever_for(&server.url, Duration::from_secs(5));

    let first = retriever.get_schedule(query()).await.unwrap();
    let second = retriever.get_schedule(query()).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(server.hits(), 1, "second request should not touch the network");
    assert_eq!(cached_files(&temp_dir), 1);
}

#[tokio::test]
async fn test_retriever_timeout_leaves_cache_untouched() {
    let server = StubServer::start(Reply::Hang(Duration::from_secs(3)));
    let (retriever, temp_dir) = retriever_for(&server.url, Duration::from_millis(200));

    let err = retriever.get_schedule(query()).await.unwrap_err();

    assert!(matches!(err, FetchError::RequestTimeout(_)));
    assert_eq!(cached_files(&temp_dir), 0);
}

#[tokio::test]
async fn test_retriever_does_not_cache_server_errors() {
    let server = StubServer::start(Reply::Status(500, "Internal Server Error"));
    let (retriever, temp_dir) = retriever_for(&server.url, Duration::from_secs(5));

    assert!(retriever.get_schedule(query()).await.is_err());
    assert!(retriever.get_schedule(query()).await.is_err());

    assert_eq!(server.hits(), 2, "every failed request should hit the network again");
    assert_eq!(cached_files(&temp_dir), 0);
}
