//! Release uploads over multipart.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gateway_core::RateLimitSettings;
use integration_tests::{fixtures, setup::TestContext, setup::PROJECT_ID};
use serde_json::json;

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn release_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("release", "1.2.3")
        .add_text("commits", r#"[{"hash":"abc","title":"fix","author":"dev"}]"#)
        .add_part(
            "file",
            Part::bytes(b"{\"version\":3}".to_vec()).file_name("main.js.map"),
        )
}

#[tokio::test]
async fn test_release_is_published() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server()
        .post("/release")
        .add_header("Authorization", bearer(&ctx.token))
        .multipart(release_form())
        .await;

    response.assert_status_ok();

    let published = ctx.published(1).await;
    let message = &published[0];
    assert_eq!(message.route, "release");
    assert_eq!(message.body["projectId"], PROJECT_ID);
    assert_eq!(message.body["type"], "add-release");
    assert_eq!(message.body["payload"]["release"], "1.2.3");
    assert_eq!(message.body["payload"]["commits"][0]["hash"], "abc");

    let files = message.body["payload"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "main.js.map");
    assert_eq!(
        STANDARD.decode(files[0]["payload"].as_str().unwrap()).unwrap(),
        b"{\"version\":3}"
    );
}

#[tokio::test]
async fn test_release_does_not_consume_quota() {
    let ctx = TestContext::with_limits(RateLimitSettings::new(1, 3600)).await;
    let server = ctx.server();

    for _ in 0..3 {
        server
            .post("/release")
            .add_header("Authorization", bearer(&ctx.token))
            .multipart(release_form())
            .await
            .assert_status_ok();
    }
    assert!(ctx.store.window(PROJECT_ID).is_none());
}

#[tokio::test]
async fn test_missing_authorization() {
    let ctx = TestContext::new().await;

    let response = ctx.server().post("/release").multipart(release_form()).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": true, "message": "Provide Authorization header" }));
}

#[tokio::test]
async fn test_body_is_not_multipart() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server()
        .post("/release")
        .add_header("Authorization", bearer(&ctx.token))
        .json(&json!({ "release": "1.0.0" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": true, "message": "Multipart form is not provided" }));
}

#[tokio::test]
async fn test_release_value_is_required_once() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/release")
        .add_header("Authorization", bearer(&ctx.token))
        .multipart(MultipartForm::new().add_text("commits", "[]"))
        .await;
    response.assert_json(&json!({ "error": true, "message": "provide `release` form value" }));

    let response = server
        .post("/release")
        .add_header("Authorization", bearer(&ctx.token))
        .multipart(
            MultipartForm::new()
                .add_text("release", "1")
                .add_text("release", "2"),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({
        "error": true,
        "message": "provide single `release` form value"
    }));
}

#[tokio::test]
async fn test_invalid_commits_json() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server()
        .post("/release")
        .add_header("Authorization", bearer(&ctx.token))
        .multipart(
            MultipartForm::new()
                .add_text("release", "1.0.0")
                .add_text("commits", "[{broken"),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": true, "message": "Invalid commits JSON format" }));
}

#[tokio::test]
async fn test_undecodable_release_token() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server()
        .post("/release")
        .add_header("Authorization", bearer("not-a-token!"))
        .multipart(release_form())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": true, "message": "Token decoding error" }));
}

#[tokio::test]
async fn test_blocked_project_release() {
    let ctx = TestContext::new().await;
    ctx.block_project().await;

    let response = ctx
        .server()
        .post("/release")
        .add_header("Authorization", bearer(&fixtures::token_for("integration-1")))
        .multipart(release_form())
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    assert!(ctx.settle().await.is_empty());
}
