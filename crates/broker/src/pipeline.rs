//! Publish Pipeline.
//!
//! Accepted messages go through a single-slot channel to one background
//! consumer that publishes them in arrival order. A slow broker makes
//! `enqueue` wait; nothing is ever dropped to make room. Publish failures
//! are logged and counted, then the message is discarded (at-most-once).

use gateway_core::BrokerMessage;
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{BrokerError, Result};
use crate::publisher::Publisher;

/// Producer side of the pipeline. Cheap to clone; the consumer stops once
/// every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct PublishHandle {
    tx: mpsc::Sender<BrokerMessage>,
}

impl PublishHandle {
    /// Hand a message to the consumer, waiting while it is busy.
    pub async fn enqueue(&self, message: BrokerMessage) -> Result<()> {
        let _waiting = WaitingGuard::new();
        self.tx
            .send(message)
            .await
            .map_err(|_| BrokerError::Closed)
    }
}

/// Keeps the waiting-producers gauge right even if the caller is cancelled.
struct WaitingGuard;

impl WaitingGuard {
    fn new() -> Self {
        metrics().publish_waiting.inc();
        Self
    }
}

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        metrics().publish_waiting.dec();
    }
}

pub struct PublishPipeline;

impl PublishPipeline {
    /// Spawn the consumer and return the handle used by the admission path.
    pub fn start(publisher: Arc<dyn Publisher>) -> (PublishHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1);
        let consumer = tokio::spawn(consume(publisher, rx));
        (PublishHandle { tx }, consumer)
    }
}

async fn consume(publisher: Arc<dyn Publisher>, mut rx: mpsc::Receiver<BrokerMessage>) {
    info!("Publish consumer started");

    while let Some(message) = rx.recv().await {
        let start = Instant::now();

        let payload = match message.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                metrics().publish_errors.inc();
                error!(route = %message.route, error = %e, "Failed to serialize broker message");
                continue;
            }
        };

        match publisher.publish(&message.route, payload).await {
            Ok(()) => {
                metrics().messages_published.inc();
                metrics()
                    .publish_latency_ms
                    .observe(start.elapsed().as_millis() as u64);
                debug!(
                    route = %message.route,
                    project_id = %message.project_id,
                    "Message published"
                );
            }
            Err(e) => {
                metrics().publish_errors.inc();
                error!(
                    route = %message.route,
                    project_id = %message.project_id,
                    error = %e,
                    "Failed to publish message, dropping it"
                );
            }
        }
    }

    info!("Publish queue drained, consumer stopped");
}
