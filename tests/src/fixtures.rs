//! Test fixtures: tokens, registry records and catcher messages.

use chrono::Utc;
use gateway_core::token::encode_token;
use gateway_core::RateLimitSettings;
use jsonwebtoken::{encode, EncodingKey, Header};
use registry::{PlanRecord, ProjectRecord, WorkspaceRecord};
use serde_json::{json, Value};

/// Integration token for a made-up integration.
pub fn token_for(integration_id: &str) -> String {
    encode_token(integration_id, &format!("{integration_id}-secret"))
}

pub fn project(id: &str, token: &str, limits: Option<RateLimitSettings>) -> ProjectRecord {
    ProjectRecord {
        id: id.to_string(),
        token: token.to_string(),
        workspace_id: None,
        rate_limit_settings: limits,
    }
}

pub fn project_in_workspace(id: &str, token: &str, workspace_id: &str) -> ProjectRecord {
    ProjectRecord {
        workspace_id: Some(workspace_id.to_string()),
        ..project(id, token, None)
    }
}

pub fn workspace_with_plan(id: &str, plan_limits: RateLimitSettings) -> WorkspaceRecord {
    WorkspaceRecord {
        id: id.to_string(),
        plan: Some(PlanRecord {
            id: Some(format!("{id}-plan")),
            rate_limit_settings: Some(plan_limits),
        }),
        rate_limit_settings: None,
    }
}

/// HS256 token in the old format, carrying the project id as a claim.
pub fn legacy_token(secret: &str, project_id: &str) -> String {
    encode(
        &Header::default(),
        &json!({ "projectId": project_id }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn error_payload() -> Value {
    json!({
        "title": "TypeError: undefined is not a function",
        "backtrace": [{ "file": "app.js", "line": 42 }],
        "context": { "user": "u-1" }
    })
}

pub fn performance_payload() -> Value {
    json!({
        "id": "tx-1",
        "name": "GET /users",
        "duration": 123.4,
        "timestamp": 1
    })
}

pub fn catcher_message(token: &str, catcher_type: &str, payload: Value) -> Value {
    json!({
        "token": token,
        "catcherType": catcher_type,
        "payload": payload
    })
}

/// Minimal Sentry envelope: header line, item header, item payload.
pub fn sentry_envelope() -> Vec<u8> {
    let header = json!({ "event_id": "9ec79c33ec9942ab8353589fcb2e04dc", "sent_at": Utc::now().to_rfc3339() });
    let item = json!({ "type": "event" });
    let event = json!({ "message": "hello", "level": "error" });
    format!("{header}\n{item}\n{event}\n").into_bytes()
}
