mod common;

use caption_service::services::providers::mock::MockCaptionProvider;
use common::TestApp;
use reqwest::Client;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn(MockCaptionProvider::ready("ok")).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "caption-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn(MockCaptionProvider::ready("ok")).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    let app = TestApp::spawn(MockCaptionProvider::ready("ok")).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type");

    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.expect("Failed to get response body");
    // Prometheus metrics format starts with # HELP or metric names.
    // The body might be empty if no metrics recorded yet, which is also valid.
    assert!(
        body.is_empty() || body.contains('#') || body.contains('_'),
        "Unexpected metrics format: {}",
        body
    );
}
