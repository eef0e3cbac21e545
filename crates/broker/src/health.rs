//! Broker health checks.

use std::sync::Arc;
use telemetry::health;
use tracing::warn;

use crate::publisher::Publisher;

/// Ping the broker and record the result in the health registry.
pub async fn check_broker(publisher: &Arc<dyn Publisher>) -> bool {
    let healthy = publisher.ping().await;
    if !healthy {
        warn!("Broker health check failed");
    }
    health().record(&health().broker, healthy);
    healthy
}
