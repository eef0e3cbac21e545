//! IP guard and the abuse cycle.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext, setup::BLACKLIST_THRESHOLD};
use serde_json::json;
use std::time::Duration;

const OFFENDER: &str = "203.0.113.9";

async fn blacklist_offender(ctx: &TestContext) {
    ctx.store.set_ip_hits(OFFENDER, BLACKLIST_THRESHOLD * 3);
    ctx.store.set_ip_hits("198.51.100.1", 1);
    assert_eq!(ctx.scheduler.abuse_cycle().await.unwrap(), 1);
}

#[tokio::test]
async fn test_hits_are_counted_per_ip() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let message = fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload());

    for _ in 0..3 {
        server
            .post("/")
            .add_header("X-Forwarded-For", "192.0.2.77, 10.0.0.1")
            .json(&message)
            .await
            .assert_status_ok();
    }

    // Counter updates run in the background.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while ctx.store.current_hits("192.0.2.77") < 3 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(ctx.store.current_hits("192.0.2.77"), 3);
    assert_eq!(ctx.store.current_hits("10.0.0.1"), 0);
}

#[tokio::test]
async fn test_blacklisted_ip_is_refused() {
    let ctx = TestContext::new().await;
    blacklist_offender(&ctx).await;
    let server = ctx.server();

    let response = server
        .post("/")
        .add_header("X-Real-IP", OFFENDER)
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    response.assert_json(&json!({ "error": true, "message": "Too Many Requests" }));

    server
        .post("/")
        .add_header("X-Real-IP", "198.51.100.1")
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await
        .assert_status_ok();

    assert_eq!(ctx.settle().await.len(), 1);
}

#[tokio::test]
async fn test_blacklist_covers_every_ingestion_route() {
    let ctx = TestContext::new().await;
    blacklist_offender(&ctx).await;
    let server = ctx.server();

    for path in ["/performance", "/release", "/api/1/envelope/"] {
        server
            .post(path)
            .add_header("X-Real-IP", OFFENDER)
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}

#[tokio::test]
async fn test_health_is_not_guarded() {
    let ctx = TestContext::new().await;
    blacklist_offender(&ctx).await;

    ctx.server()
        .get("/health")
        .add_header("X-Real-IP", OFFENDER)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_offenders_trigger_one_alert_each() {
    let ctx = TestContext::new().await;
    blacklist_offender(&ctx).await;

    let alerts = ctx.notifier.sent();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains(&format!("Too many messages from {OFFENDER}")));
    assert!(alerts[0].ends_with(&(BLACKLIST_THRESHOLD * 3).to_string()));

    // The period counters were rotated, so the next cycle is quiet.
    assert_eq!(ctx.scheduler.abuse_cycle().await.unwrap(), 0);
    assert!(ctx.abuse.is_blacklisted(OFFENDER));
}
