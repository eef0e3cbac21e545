use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Broker client contract: one publish per accepted message.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, route: &str, payload: Bytes) -> Result<()>;

    /// Whether the broker currently answers metadata requests.
    async fn ping(&self) -> bool;
}
