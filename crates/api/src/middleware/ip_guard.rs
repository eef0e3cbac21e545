//! IP Guard: refuse blacklisted clients and count every other hit.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gateway_core::Rejection;
use telemetry::metrics;
use tracing::debug;

use crate::extractors::ClientIp;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Runs before every ingestion route. The hit counter update is fire and
/// forget, so a store outage never delays or fails the request.
pub async fn ip_guard(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Response {
    if let Some(ip) = ip.as_deref() {
        if state.abuse.is_blacklisted(ip) {
            metrics().blacklisted_requests.inc();
            debug!(ip = %ip, "Request from blacklisted IP");
            return ApiResponse::from(Rejection::Blacklisted).into_response();
        }
        state.abuse.record_hit(ip);
    }

    next.run(request).await
}
