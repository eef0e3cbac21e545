//! Release adapter: `POST /release` with a multipart form.
//!
//! Form values: exactly one `release`, at most one `commits` (JSON).
//! Every part with a file name is attached as a release file.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
};
use gateway_core::{Category, Rejection, ReleaseFile, ReleasePayload};
use serde_json::value::RawValue;
use tracing::{debug, warn};

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default)]
struct ReleaseForm {
    release: Vec<String>,
    commits: Vec<String>,
    files: Vec<ReleaseFile>,
    bytes: usize,
}

/// POST /release
pub async fn release_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse {
    let result = accept(&state, &headers, multipart).await;
    match &result {
        Ok(()) => debug!("Release accepted"),
        Err(rejection) => debug!(rejection = %rejection, "Release rejected"),
    }
    result.into()
}

async fn accept(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(), Rejection> {
    let token = bearer_token(headers).ok_or_else(|| {
        warn!("Release request without Authorization header");
        Rejection::malformed("Provide Authorization header")
    })?;

    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "Release request without multipart form");
        Rejection::malformed("Multipart form is not provided")
    })?;

    let max = state.config().max_bytes(Category::Release);
    let form = read_form(multipart, max).await?;
    let release = single_value(&form.release, "release")?;

    let commits = match form.commits.first().map(String::as_str) {
        None | Some("") => None,
        Some(commits) => Some(
            RawValue::from_string(commits.to_string())
                .map_err(|_| Rejection::malformed("Invalid commits JSON format"))?,
        ),
    };

    let payload = ReleasePayload {
        release,
        commits,
        files: form.files,
    };
    state.admission.admit_release(token, payload).await
}

/// Everything after the first seven characters (`Bearer `) of a header at
/// least eight long.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if value.len() < 8 {
        return None;
    }
    Some(value.strip_prefix("Bearer ").unwrap_or_else(|| value.get(7..).unwrap_or_default()))
}

async fn read_form(mut multipart: Multipart, max: usize) -> Result<ReleaseForm, Rejection> {
    let mut form = ReleaseForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_rejection)?;

        form.bytes += data.len();
        if form.bytes > max {
            warn!(size = form.bytes, max = max, "Release form too large");
            return Err(Rejection::TooLarge);
        }

        match (file_name, name.as_str()) {
            (Some(file_name), _) => {
                debug!(file = %file_name, size = data.len(), "Release file received");
                form.files.push(ReleaseFile::new(file_name, &data));
            }
            (None, "release") => form.release.push(text(&data)?),
            (None, "commits") => form.commits.push(text(&data)?),
            (None, other) => debug!(field = %other, "Ignoring release form field"),
        }
    }

    Ok(form)
}

fn single_value(values: &[String], key: &str) -> Result<String, Rejection> {
    match values {
        [] => Err(Rejection::malformed(format!("provide `{key}` form value"))),
        [value] => Ok(value.clone()),
        _ => Err(Rejection::malformed(format!("provide single `{key}` form value"))),
    }
}

fn text(data: &[u8]) -> Result<String, Rejection> {
    String::from_utf8(data.to_vec()).map_err(|_| Rejection::malformed("Form value is not UTF-8"))
}

fn multipart_rejection(err: MultipartError) -> Rejection {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Rejection::TooLarge
    } else {
        warn!(error = %err.body_text(), "Failed to read multipart form");
        Rejection::malformed("Multipart form is not provided")
    }
}
