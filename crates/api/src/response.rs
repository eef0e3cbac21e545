//! Responses sent back to catchers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{Rejection, RejectionClass, ResponseMessage};
use telemetry::metrics;

/// `{"error": bool, "message": string}` with the status code beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse(pub ResponseMessage);

impl ApiResponse {
    pub fn ok() -> Self {
        Self(ResponseMessage::ok())
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<Rejection> for ApiResponse {
    fn from(rejection: Rejection) -> Self {
        if rejection.class() == RejectionClass::Client {
            metrics().client_rejections.inc();
        }
        Self(ResponseMessage::from(rejection))
    }
}

impl From<Result<(), Rejection>> for ApiResponse {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(rejection) => rejection.into(),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0)).into_response()
    }
}
