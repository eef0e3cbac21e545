use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failures reading from the project registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("registry unavailable: {0}")]
    Unavailable(String),
}
