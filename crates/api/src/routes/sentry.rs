//! Sentry-compatible envelope endpoints.
//!
//! `POST /api/{project}/envelope/` and `POST /api/{project}/store/`. The
//! envelope itself is never parsed; it is wrapped as base64 and forwarded.
//! The project segment of the path is ignored, the integration token
//! travels as the Sentry public key.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use gateway_core::{CanonicalSubmission, Category, Rejection, SentryEnvelope};
use serde::Deserialize;
use std::io::Read;
use tracing::{debug, error, warn};

use super::catcher::body_rejection;
use crate::extractors::ClientIp;
use crate::response::ApiResponse;
use crate::state::AppState;

pub const SENTRY_CATCHER_TYPE: &str = "external/sentry";

const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, X-Sentry-Auth"),
    (header::ACCESS_CONTROL_MAX_AGE, "86400"),
];

#[derive(Debug, Default, Deserialize)]
pub struct SentryQuery {
    sentry_key: Option<String>,
}

/// OPTIONS preflight.
pub async fn sentry_options_handler() -> Response {
    (StatusCode::NO_CONTENT, CORS_HEADERS).into_response()
}

/// POST envelope or store request.
pub async fn sentry_handler(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    query: Option<Query<SentryQuery>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let result = accept(&state, ip, query, &headers, body).await;
    if let Err(rejection) = &result {
        debug!(rejection = %rejection, "Sentry submission rejected");
    }
    (CORS_HEADERS, ApiResponse::from(result)).into_response()
}

async fn accept(
    state: &AppState,
    ip: Option<String>,
    query: SentryQuery,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(), Rejection> {
    let body = body.map_err(|rejection| body_rejection(&rejection))?;
    let max = state.config().max_bytes(Category::Sentry);
    state.admission.check_size(Category::Sentry, body.len())?;

    let token = match query.sentry_key {
        Some(key) => key,
        None => {
            let auth = headers
                .get("X-Sentry-Auth")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    warn!("Sentry request without X-Sentry-Auth header");
                    Rejection::malformed("X-Sentry-Auth header is missing")
                })?;
            sentry_key_from_auth(auth).ok_or_else(|| {
                warn!("X-Sentry-Auth header without sentry_key");
                Rejection::malformed("sentry_key not found")
            })?
        }
    };
    if token.is_empty() {
        return Err(Rejection::EmptyToken);
    }

    let encoding = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let envelope = match encoding {
        "gzip" => decompress(flate2::read::GzDecoder::new(&body[..]), max)
            .map_err(|e| decompress_rejection(e, "Failed to decompress gzip body"))?,
        "br" => decompress(brotli::Decompressor::new(&body[..], 4096), max)
            .map_err(|e| decompress_rejection(e, "Failed to decompress brotli body"))?,
        _ => body.to_vec(),
    };

    let payload = SentryEnvelope::wrap(&envelope).map_err(|e| {
        error!(error = %e, "Failed to wrap Sentry envelope");
        Rejection::malformed("Cannot serialize envelope")
    })?;

    state
        .admission
        .admit(CanonicalSubmission {
            category: Category::Sentry,
            token,
            catcher_type: SENTRY_CATCHER_TYPE.to_string(),
            payload,
            remote_ip: ip,
        })
        .await
}

/// `Sentry sentry_key=abc, sentry_version=7`; pairs may be separated by
/// `", "` or a bare comma.
pub fn sentry_key_from_auth(auth: &str) -> Option<String> {
    let auth = auth.strip_prefix("Sentry ").unwrap_or(auth);
    auth.split(',')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == "sentry_key")
        .map(|(_, value)| value.to_string())
}

enum DecompressError {
    Io(std::io::Error),
    TooLarge,
}

fn decompress<R: Read>(reader: R, max: usize) -> Result<Vec<u8>, DecompressError> {
    let mut out = Vec::new();
    reader
        .take(max as u64 + 1)
        .read_to_end(&mut out)
        .map_err(DecompressError::Io)?;
    if out.len() > max {
        return Err(DecompressError::TooLarge);
    }
    Ok(out)
}

fn decompress_rejection(err: DecompressError, message: &'static str) -> Rejection {
    match err {
        DecompressError::Io(e) => {
            warn!(error = %e, "{message}");
            Rejection::malformed(message)
        }
        DecompressError::TooLarge => Rejection::TooLarge,
    }
}
