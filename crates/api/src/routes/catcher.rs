//! JSON catcher endpoints: `POST /` for errors, `POST /performance`.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
};
use gateway_core::{Category, Rejection};
use tracing::debug;

use crate::extractors::ClientIp;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST / - error events.
pub async fn errors_handler(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    submit(&state, Category::Errors, ip, body).await
}

/// POST /performance - performance samples.
pub async fn performance_handler(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    submit(&state, Category::Performance, ip, body).await
}

async fn submit(
    state: &AppState,
    category: Category,
    ip: Option<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejection(&rejection).into(),
    };

    let result = state.admission.submit(category, &body, ip).await;
    if let Err(rejection) = &result {
        debug!(category = category.as_str(), rejection = %rejection, "Submission rejected");
    }
    result.into()
}

/// A body the server could not read is either over the limit or broken.
pub(crate) fn body_rejection(rejection: &BytesRejection) -> Rejection {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Rejection::TooLarge
    } else {
        Rejection::BadRequest
    }
}
