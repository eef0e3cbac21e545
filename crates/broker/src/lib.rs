//! Broker publishing for accepted submissions.

pub mod config;
pub mod error;
pub mod health;
pub mod kafka;
pub mod pipeline;
pub mod publisher;
pub mod topics;

pub use config::BrokerConfig;
pub use error::{BrokerError, Result};
pub use kafka::KafkaPublisher;
pub use pipeline::{PublishHandle, PublishPipeline};
pub use publisher::Publisher;
pub use topics::topic_for_route;
