//! Kafka-compatible publisher using rskafka.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rskafka::client::{
    partition::{Compression, PartitionClient, UnknownTopicHandling},
    Client, ClientBuilder, Credentials, SaslConfig,
};
use rskafka::record::Record;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::config::BrokerConfig;
use crate::error::{BrokerError, Result};
use crate::publisher::Publisher;
use crate::topics::topic_for_route;

/// Creates a TLS configuration for managed clusters.
fn create_tls_config() -> Arc<rustls::ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

fn compression_from(name: &str) -> Compression {
    match name {
        "gzip" => Compression::Gzip,
        "snappy" => Compression::Snappy,
        "lz4" => Compression::Lz4,
        "zstd" => Compression::Zstd,
        _ => Compression::NoCompression,
    }
}

pub struct KafkaPublisher {
    client: Client,
    config: BrokerConfig,
    compression: Compression,
    /// Cached partition clients per topic
    partitions: RwLock<BTreeMap<String, Arc<PartitionClient>>>,
}

impl KafkaPublisher {
    pub async fn connect(config: BrokerConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new(vec![config.broker_string()]);

        // TLS and SASL only when credentials are provided
        if let Some((username, password)) = config.credentials() {
            builder = builder
                .tls_config(create_tls_config())
                .sasl_config(SaslConfig::ScramSha256(Credentials::new(
                    username.to_string(),
                    password.to_string(),
                )));
        }

        let client = builder
            .build()
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        info!(brokers = %config.broker_string(), "Connected to broker");

        Ok(Self {
            client,
            compression: compression_from(&config.compression),
            config,
            partitions: RwLock::new(BTreeMap::new()),
        })
    }

    /// Gets or creates the partition client for a topic.
    async fn partition(&self, topic: &str) -> Result<Arc<PartitionClient>> {
        {
            let partitions = self.partitions.read().await;
            if let Some(client) = partitions.get(topic) {
                return Ok(client.clone());
            }
        }

        let client = self
            .client
            .partition_client(topic.to_string(), 0, UnknownTopicHandling::Retry)
            .await
            .map_err(|e| BrokerError::Partition {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        let client = Arc::new(client);

        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .entry(topic.to_string())
            .or_insert(client)
            .clone())
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(&self, route: &str, payload: Bytes) -> Result<()> {
        let topic = topic_for_route(&self.config.topic_prefix, route);
        let client = self.partition(&topic).await?;

        let record = Record {
            key: None,
            value: Some(payload.to_vec()),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        client
            .produce(vec![record], self.compression)
            .await
            .map_err(|e| {
                error!(topic = %topic, error = %e, "Failed to produce message");
                BrokerError::Produce {
                    topic: topic.clone(),
                    reason: e.to_string(),
                }
            })?;

        debug!(topic = %topic, "Published message");
        Ok(())
    }

    async fn ping(&self) -> bool {
        match self.client.list_topics().await {
            Ok(topics) => {
                debug!(topics = topics.len(), "Broker connection healthy");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to list broker topics");
                false
            }
        }
    }
}
