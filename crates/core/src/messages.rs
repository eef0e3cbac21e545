//! Wire shapes: what catchers send, what the broker receives, what clients get back.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Rejection, Result};

/// Submission category. Selects the size limit, the default route and the
/// metrics a submission is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Errors,
    Performance,
    Sentry,
    Release,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Errors => "errors",
            Self::Performance => "performance",
            Self::Sentry => "sentry",
            Self::Release => "release",
        }
    }

    /// Category of a WebSocket frame, chosen by the catcher type prefix.
    pub fn from_catcher_type(catcher_type: &str) -> Option<Self> {
        match catcher_type.split('/').next() {
            Some("errors") => Some(Self::Errors),
            Some("performance") => Some(Self::Performance),
            _ => None,
        }
    }

    /// Whether submissions in this category consume event quota.
    pub fn is_metered(&self) -> bool {
        !matches!(self, Self::Release)
    }
}

/// JSON envelope sent by catchers over HTTP and WebSocket.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatcherMessage {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub catcher_type: String,
    /// `None` only when the field is absent; an explicit `null` is kept.
    #[serde(default, deserialize_with = "present_raw")]
    pub payload: Option<Box<RawValue>>,
}

fn present_raw<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl CatcherMessage {
    pub fn parse(body: &[u8]) -> std::result::Result<Self, Rejection> {
        serde_json::from_slice(body).map_err(|_| Rejection::InvalidJson)
    }

    /// Find the `catcherType` value without parsing the whole body.
    ///
    /// Only picks a size limit before parsing; [`CatcherMessage::parse`]
    /// stays authoritative.
    pub fn peek_catcher_type(body: &[u8]) -> Option<&str> {
        const KEY: &[u8] = b"\"catcherType\"";

        let at = body.windows(KEY.len()).position(|w| w == KEY)? + KEY.len();
        let rest = trim_ascii_start(&body[at..]).strip_prefix(b":")?;
        let rest = trim_ascii_start(rest).strip_prefix(b"\"")?;
        let end = rest.iter().position(|&b| b == b'"')?;
        std::str::from_utf8(&rest[..end]).ok()
    }

    /// Check required fields and build the transport-agnostic submission.
    pub fn into_submission(
        self,
        category: Category,
        remote_ip: Option<String>,
    ) -> std::result::Result<CanonicalSubmission, Rejection> {
        let payload = match self.payload {
            Some(raw) if !raw.get().is_empty() => Bytes::from(raw.get().to_owned()),
            _ => return Err(Rejection::EmptyPayload),
        };
        if self.token.is_empty() {
            return Err(Rejection::EmptyToken);
        }
        if self.catcher_type.is_empty() {
            return Err(Rejection::EmptyCatcherType);
        }

        Ok(CanonicalSubmission {
            category,
            token: self.token,
            catcher_type: self.catcher_type,
            payload,
            remote_ip,
        })
    }
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[skip..]
}

/// Transport-agnostic unit handed to the admission pipeline.
#[derive(Debug, Clone)]
pub struct CanonicalSubmission {
    pub category: Category,
    pub token: String,
    pub catcher_type: String,
    /// JSON bytes; validated by the pipeline, otherwise opaque.
    pub payload: Bytes,
    pub remote_ip: Option<String>,
}

/// Unit published to the broker. `route` selects the topic and is not
/// part of the serialized body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerMessage {
    #[serde(skip)]
    pub route: String,
    pub project_id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catcher_type: Option<String>,
    pub payload: Box<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl BrokerMessage {
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// Message type tag for release submissions.
pub const ADD_RELEASE_TYPE: &str = "add-release";

/// Body returned to clients. The status code travels beside it, never inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(skip)]
    pub status: u16,
    pub error: bool,
    pub message: String,
}

impl ResponseMessage {
    pub fn ok() -> Self {
        Self {
            status: 200,
            error: false,
            message: "OK".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.error
    }
}

impl From<Rejection> for ResponseMessage {
    fn from(rejection: Rejection) -> Self {
        Self {
            status: rejection.http_status(),
            error: true,
            message: rejection.to_string(),
        }
    }
}

/// Overwrite `timestamp` in an object payload with the ingestion time.
pub fn stamp_timestamp(
    payload: &[u8],
    now: i64,
) -> std::result::Result<Box<RawValue>, Rejection> {
    let mut object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(payload).map_err(|_| Rejection::PayloadNotObject)?;
    object.insert("timestamp".to_string(), now.into());
    serde_json::value::to_raw_value(&object).map_err(|_| Rejection::PayloadNotObject)
}

/// Sentry envelopes are forwarded opaquely as `{"envelope": "<base64>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SentryEnvelope {
    pub envelope: String,
}

impl SentryEnvelope {
    pub fn wrap(raw: &[u8]) -> Result<Bytes> {
        let envelope = Self {
            envelope: STANDARD.encode(raw),
        };
        Ok(Bytes::from(serde_json::to_vec(&envelope)?))
    }
}

/// Payload of an `add-release` message.
#[derive(Debug, Serialize)]
pub struct ReleasePayload {
    pub release: String,
    pub commits: Option<Box<RawValue>>,
    pub files: Vec<ReleaseFile>,
}

/// One uploaded file (usually a sourcemap), base64 encoded.
#[derive(Debug, Serialize)]
pub struct ReleaseFile {
    pub name: String,
    pub payload: String,
}

impl ReleaseFile {
    pub fn new(name: impl Into<String>, content: &[u8]) -> Self {
        Self {
            name: name.into(),
            payload: STANDARD.encode(content),
        }
    }
}
