//! Integration tests for PageFetcher using wiremock
//!
//! These validate the single-GET fetch and the content-type gate. Every
//! rejection collapses to `None`; the tests only distinguish them through
//! the mock server setup.

use onehop::fetcher::PageFetcher;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer) -> PageFetcher {
    PageFetcher::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_html_success() {
    let mock_server = MockServer::start().await;
    let html = "<!DOCTYPE html><html><head><title>Hi</title></head><body><p>Body</p></body></html>";

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(&mock_server)
        .await;

    let page = fetcher(&mock_server).fetch("/article").await.expect("should fetch");
    assert!(page.html.contains("Body"));
    assert!(page.content_type.contains("html"));
}

#[tokio::test]
async fn test_json_content_type_is_not_fetchable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"))
        .mount(&mock_server)
        .await;

    assert!(fetcher(&mock_server).fetch("/api").await.is_none());
}

#[tokio::test]
async fn test_missing_content_type_is_not_fetchable() {
    let mock_server = MockServer::start().await;

    // ResponseTemplate with no body sets no content-type header.
    Mock::given(method("GET"))
        .and(path("/untyped"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    assert!(fetcher(&mock_server).fetch("/untyped").await.is_none());
}

#[tokio::test]
async fn test_error_status_is_not_fetchable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1) // one GET, no retry
        .mount(&mock_server)
        .await;

    assert!(fetcher(&mock_server).fetch("/gone").await.is_none());

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(fetcher(&mock_server).fetch("/broken").await.is_none());
}

#[tokio::test]
async fn test_unreachable_host_is_not_fetchable() {
    let fetcher = PageFetcher::new(Duration::from_secs(1), None).unwrap();
    assert!(fetcher.fetch("http://127.0.0.1:1/nothing").await.is_none());
}
