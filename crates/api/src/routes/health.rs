//! Health and metrics endpoints.

use axum::{extract::State, http::StatusCode, Json};
use broker::health::check_broker;
use serde::Serialize;
use telemetry::{health, metrics, MetricsSnapshot};
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub redis_status: bool,
    pub registry_status: bool,
    /// Informational; does not affect the status code
    pub broker_status: bool,
}

/// GET /health - 200 when the shared store and the registry answer.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (redis, registry, broker) = tokio::join!(
        state.store.ping(),
        state.registry.ping(),
        check_broker(&state.publisher)
    );

    if let Err(e) = &redis {
        warn!(error = %e, "Shared store health check failed");
    }
    if let Err(e) = &registry {
        warn!(error = %e, "Registry health check failed");
    }

    health().record(&health().redis, redis.is_ok());
    health().record(&health().registry, registry.is_ok());

    let body = HealthResponse {
        redis_status: redis.is_ok(),
        registry_status: registry.is_ok(),
        broker_status: broker,
    };
    let status = if body.redis_status && body.registry_status {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(body))
}

/// GET /metrics - JSON snapshot of all counters and gauges.
pub async fn metrics_handler() -> Json<MetricsSnapshot> {
    Json(metrics().snapshot())
}
