use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures talking to the shared store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("unexpected script reply: {0}")]
    ScriptReply(i64),

    #[error("counter is not a number: {0}")]
    CounterValue(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
