//! Health and metrics endpoints.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::json;

#[tokio::test]
async fn test_health_ok() {
    let ctx = TestContext::new().await;
    let response = ctx.server().get("/health").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "redis_status": true,
        "registry_status": true,
        "broker_status": true
    }));
}

#[tokio::test]
async fn test_health_reports_store_outage() {
    let ctx = TestContext::new().await;
    ctx.store.set_unavailable(true);

    let response = ctx.server().get("/health").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json();
    assert_eq!(body["redis_status"], false);
    assert_eq!(body["registry_status"], true);
}

#[tokio::test]
async fn test_health_reports_registry_outage() {
    let ctx = TestContext::new().await;
    ctx.registry.set_unavailable(true);

    let response = ctx.server().get("/health").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<serde_json::Value>()["registry_status"], false);
}

#[tokio::test]
async fn test_broker_outage_does_not_fail_health() {
    let ctx = TestContext::new().await;
    ctx.publisher.set_should_fail(true);

    let response = ctx.server().get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["broker_status"], false);
}

#[tokio::test]
async fn test_metrics_snapshot() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/")
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await
        .assert_status_ok();
    ctx.published(1).await;

    let response = server.get("/metrics").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["errors_processed"].as_u64().unwrap() >= 1);
    assert!(body["messages_published"].as_u64().unwrap() >= 1);
    assert!(body["cached_tokens"].is_u64());
}
