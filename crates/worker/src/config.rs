//! Background task configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Token resolver cache refresh interval (seconds)
    #[serde(default = "default_tokens_interval")]
    pub tokens_interval_secs: u64,
    /// Project limits cache refresh interval (seconds)
    #[serde(default = "default_limits_interval")]
    pub limits_interval_secs: u64,
    /// Blocked projects reload interval (seconds)
    #[serde(default = "default_blocked_interval")]
    pub blocked_interval_secs: u64,
    /// Abuse evaluation period (seconds)
    #[serde(default = "default_blacklist_interval")]
    pub blacklist_interval_secs: u64,
    /// Alert endpoint; alerts are only logged when unset
    #[serde(default)]
    pub notify_url: Option<String>,
    /// First line of every alert message
    #[serde(default = "default_alert_title")]
    pub alert_title: String,
}

fn default_tokens_interval() -> u64 {
    60
}

fn default_limits_interval() -> u64 {
    60
}

fn default_blocked_interval() -> u64 {
    30
}

fn default_blacklist_interval() -> u64 {
    15
}

fn default_alert_title() -> String {
    "Ingest Gateway ⚠️".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tokens_interval_secs: default_tokens_interval(),
            limits_interval_secs: default_limits_interval(),
            blocked_interval_secs: default_blocked_interval(),
            blacklist_interval_secs: default_blacklist_interval(),
            notify_url: None,
            alert_title: default_alert_title(),
        }
    }
}

impl WorkerConfig {
    pub fn tokens_interval(&self) -> Duration {
        Duration::from_secs(self.tokens_interval_secs.max(1))
    }

    pub fn limits_interval(&self) -> Duration {
        Duration::from_secs(self.limits_interval_secs.max(1))
    }

    pub fn blocked_interval(&self) -> Duration {
        Duration::from_secs(self.blocked_interval_secs.max(1))
    }

    pub fn blacklist_interval(&self) -> Duration {
        Duration::from_secs(self.blacklist_interval_secs.max(1))
    }
}
