//! Broker configuration.

use serde::{Deserialize, Serialize};

/// Kafka-compatible broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker addresses
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    /// Prefix prepended to every topic derived from a route
    #[serde(default)]
    pub topic_prefix: String,
    /// Compression type (none, gzip, snappy, lz4, zstd)
    #[serde(default = "default_compression")]
    pub compression: String,
    /// SASL username (managed clusters)
    #[serde(default)]
    pub sasl_username: Option<String>,
    /// SASL password (managed clusters)
    #[serde(default)]
    pub sasl_password: Option<String>,
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_compression() -> String {
    "lz4".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic_prefix: String::new(),
            compression: default_compression(),
            sasl_username: None,
            sasl_password: None,
        }
    }
}

impl BrokerConfig {
    /// Returns the broker list as a comma-separated string.
    pub fn broker_string(&self) -> String {
        self.brokers.join(",")
    }

    /// SASL credentials, when both parts are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.sasl_username, &self.sasl_password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}
