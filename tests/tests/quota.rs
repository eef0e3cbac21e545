//! Quota enforcement through the HTTP path.

use axum::http::StatusCode;
use gateway_core::RateLimitSettings;
use integration_tests::{fixtures, setup::TestContext, setup::PROJECT_ID};
use serde_json::json;

#[tokio::test]
async fn test_quota_rejects_after_limit() {
    let ctx = TestContext::with_limits(RateLimitSettings::new(2, 3600)).await;
    let server = ctx.server();
    let message = fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload());

    server.post("/").json(&message).await.assert_status_ok();
    server.post("/").json(&message).await.assert_status_ok();

    let response = server.post("/").json(&message).await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    response.assert_json(&json!({ "error": true, "message": "Rate limit exceeded" }));

    let (_, count) = ctx.store.window(PROJECT_ID).unwrap();
    assert_eq!(count, 2);
    assert_eq!(ctx.published(2).await.len(), 2);
}

#[tokio::test]
async fn test_performance_shares_the_quota() {
    let ctx = TestContext::with_limits(RateLimitSettings::new(1, 3600)).await;
    let server = ctx.server();

    server
        .post("/")
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await
        .assert_status_ok();

    server
        .post("/performance")
        .json(&fixtures::catcher_message(
            &ctx.token,
            "performance/js",
            fixtures::performance_payload(),
        ))
        .await
        .assert_status(StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_expired_window_resets() {
    let ctx = TestContext::with_limits(RateLimitSettings::new(1, 60)).await;
    let stale = chrono::Utc::now().timestamp() - 120;
    ctx.store.set_window(PROJECT_ID, stale, 1);

    ctx.server()
        .post("/")
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await
        .assert_status_ok();

    let (start, count) = ctx.store.window(PROJECT_ID).unwrap();
    assert!(start > stale);
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_workspace_plan_limits_apply() {
    let ctx = TestContext::new().await;
    let token = fixtures::token_for("integration-2");
    ctx.registry.set_projects(vec![fixtures::project_in_workspace(
        "project-2",
        &token,
        "ws-1",
    )]);
    ctx.registry.set_workspaces(vec![fixtures::workspace_with_plan(
        "ws-1",
        RateLimitSettings::new(1, 3600),
    )]);
    ctx.refresh().await;
    let server = ctx.server();

    let message = fixtures::catcher_message(&token, "errors/js", fixtures::error_payload());
    server.post("/").json(&message).await.assert_status_ok();
    server
        .post("/")
        .json(&message)
        .await
        .assert_status(StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_store_outage_is_a_server_error() {
    let ctx = TestContext::with_limits(RateLimitSettings::new(10, 60)).await;
    ctx.store.set_unavailable(true);

    let response = ctx
        .server()
        .post("/")
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": true, "message": "Failed to update rate limit" }));
}

#[tokio::test]
async fn test_unlimited_project_never_touches_the_store() {
    let ctx = TestContext::new().await;
    ctx.store.set_unavailable(true);

    ctx.server()
        .post("/")
        .json(&fixtures::catcher_message(&ctx.token, "errors/js", fixtures::error_payload()))
        .await
        .assert_status_ok();
    assert!(ctx.store.window(PROJECT_ID).is_none());
}
