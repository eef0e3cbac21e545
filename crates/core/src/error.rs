//! Error types for the ingest gateway.
//!
//! Rejections are grouped into four classes:
//! - CLIENT: malformed, oversized or unauthenticated submissions (400)
//! - POLICY: blocked project or exhausted quota (402)
//! - THROTTLED: blacklisted remote address (429)
//! - DEPENDENCY: shared store or publish queue unavailable (500)

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Status classification carried alongside every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionClass {
    Client,
    Policy,
    Throttled,
    Dependency,
}

impl RejectionClass {
    /// Get the class code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Policy => "POLICY",
            Self::Throttled => "THROTTLED",
            Self::Dependency => "DEPENDENCY",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Client => 400,
            Self::Policy => 402,
            Self::Throttled => 429,
            Self::Dependency => 500,
        }
    }
}

/// Terminal outcome of a submission that was not accepted.
///
/// The `Display` output is the message returned to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Request is too large")]
    TooLarge,

    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Payload is empty")]
    EmptyPayload,

    #[error("Token is empty")]
    EmptyToken,

    #[error("CatcherType is empty")]
    EmptyCatcherType,

    #[error("Integration token invalid")]
    InvalidToken,

    /// Legacy JWT verification failed; carries the decoder's reason.
    #[error("{0}")]
    LegacyToken(String),

    #[error("Invalid payload JSON format")]
    InvalidPayload,

    #[error("Failed to parse payload JSON")]
    PayloadNotObject,

    /// Adapter-specific client error (missing headers, bad forms, bad encodings).
    #[error("{0}")]
    Malformed(String),

    #[error("Project has exceeded the events limit")]
    ProjectBlocked,

    #[error("Rate limit exceeded")]
    QuotaExceeded,

    #[error("Too Many Requests")]
    Blacklisted,

    #[error("Failed to update rate limit")]
    QuotaUnavailable,

    #[error("Failed to enqueue message")]
    PublishUnavailable,

    /// Recovered panic inside a request handler.
    #[error("Bad request")]
    BadRequest,
}

impl Rejection {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Get the status classification for this rejection.
    pub fn class(&self) -> RejectionClass {
        match self {
            Self::ProjectBlocked | Self::QuotaExceeded => RejectionClass::Policy,
            Self::Blacklisted => RejectionClass::Throttled,
            Self::QuotaUnavailable | Self::PublishUnavailable => RejectionClass::Dependency,
            _ => RejectionClass::Client,
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        self.class().http_status()
    }
}

/// Unified error type for decoding and serialization in the core crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("token is not valid base64: {0}")]
    TokenEncoding(#[from] base64::DecodeError),

    #[error("token payload is malformed: {0}")]
    TokenPayload(#[source] serde_json::Error),

    #[error("invalid JWT signature")]
    JwtSignature,

    #[error("empty projectId")]
    EmptyProjectId,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
