//! Alert notifications.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("alert request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("alert endpoint returned {0}")]
    Status(u16),
}

/// External alert channel, one message per call.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Logs alerts instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!(message = %message, "Alert");
        Ok(())
    }
}

/// Posts `message=…&parse_mode=Markdown` as a form to a chat webhook.
pub struct WebhookNotifier {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.url)
            .form(&[("message", message), ("parse_mode", "Markdown")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(status = status, "Alert endpoint returned error");
            return Err(NotifyError::Status(status));
        }
        Ok(())
    }
}

/// Webhook notifier when a URL is configured, log-only otherwise.
pub fn notifier_from_url(url: Option<&str>) -> Arc<dyn AlertNotifier> {
    match url.filter(|u| !u.is_empty()) {
        Some(url) => match WebhookNotifier::new(url) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!(error = %e, "Failed to build alert client, alerts will only be logged");
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    }
}

pub fn blacklist_alert(title: &str, ip: &str, count: u64) -> String {
    format!("{title}\n\nToo many messages from {ip}\n{count}")
}
