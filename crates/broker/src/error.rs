use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrokerError>;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to connect to broker: {0}")]
    Connect(String),

    #[error("failed to get partition client for {topic}: {reason}")]
    Partition { topic: String, reason: String },

    #[error("failed to produce to {topic}: {reason}")]
    Produce { topic: String, reason: String },

    #[error("failed to serialize message: {0}")]
    Serialization(#[from] gateway_core::Error),

    #[error("publish pipeline is closed")]
    Closed,
}
