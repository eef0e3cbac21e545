//! Panic recovery for request handling.

use axum::response::{IntoResponse, Response};
use gateway_core::Rejection;
use std::any::Any;
use tracing::error;

use crate::response::ApiResponse;

/// Used with `CatchPanicLayer::custom`: one bad request must not take the
/// listener down.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Request handler panicked");

    ApiResponse::from(Rejection::BadRequest).into_response()
}
