//! API routes.

pub mod catcher;
pub mod health;
pub mod release;
pub mod sentry;
pub mod ws;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{handle_panic, ip_guard};
use crate::state::AppState;

/// Creates the API router.
///
/// Ingestion routes sit behind the IP guard; `/health` and `/metrics` do
/// not. The Sentry routes answer their own preflight, so the CORS layer
/// only wraps the JSON and release endpoints. The WebSocket route stays
/// outside response compression.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catchers = Router::new()
        .route("/", post(catcher::errors_handler))
        .route("/performance", post(catcher::performance_handler))
        .route("/release", post(release::release_handler))
        .layer(cors)
        .layer(CompressionLayer::new());

    let sentry = Router::new()
        .route(
            "/api/:project/envelope/",
            post(sentry::sentry_handler).options(sentry::sentry_options_handler),
        )
        .route(
            "/api/:project/store/",
            post(sentry::sentry_handler).options(sentry::sentry_options_handler),
        );

    let ingest = Router::new()
        .merge(catchers)
        .merge(sentry)
        .route("/ws", get(ws::ws_handler))
        .route_layer(from_fn_with_state(state.clone(), ip_guard));

    let ops = Router::new()
        .route("/health", get(health::health_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(CompressionLayer::new());

    let layers = ServiceBuilder::new()
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config().max_request_body()));

    Router::new()
        .merge(ingest)
        .merge(ops)
        .layer(layers)
        .with_state(state)
}
