//! Mock implementations for testing.

use async_trait::async_trait;
use broker::{BrokerError, Publisher};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use worker::{AlertNotifier, NotifyError};

/// One message as the broker would have received it.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub route: String,
    pub body: serde_json::Value,
}

/// Publisher that keeps messages in memory.
///
/// Sits behind the real publish pipeline, so tests exercise the same
/// enqueue and consumer path as production minus the Kafka transport.
#[derive(Default)]
pub struct MockPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    should_fail: AtomicBool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().len()
    }

    /// Fail every publish, as if the broker were down.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, route: &str, payload: Bytes) -> broker::Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(BrokerError::Produce {
                topic: route.to_string(),
                reason: "mock publisher failure".into(),
            });
        }

        let body = serde_json::from_slice(&payload).map_err(|e| BrokerError::Produce {
            topic: route.to_string(),
            reason: e.to_string(),
        })?;
        self.published.lock().push(PublishedMessage {
            route: route.to_string(),
            body,
        });
        Ok(())
    }

    async fn ping(&self) -> bool {
        !self.should_fail.load(Ordering::Relaxed)
    }
}

/// Notifier that records alerts.
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl AlertNotifier for MockNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_publisher_captures_messages() {
        let mock = MockPublisher::new();
        mock.publish("errors/default", Bytes::from_static(br#"{"projectId":"p"}"#))
            .await
            .unwrap();

        let messages = mock.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].route, "errors/default");
        assert_eq!(messages[0].body["projectId"], "p");
    }

    #[tokio::test]
    async fn test_mock_publisher_failure_mode() {
        let mock = MockPublisher::new();
        mock.set_should_fail(true);

        assert!(mock.publish("r", Bytes::from_static(b"{}")).await.is_err());
        assert!(!mock.ping().await);
        assert_eq!(mock.count(), 0);
    }
}
