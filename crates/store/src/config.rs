//! Shared store configuration.

use gateway_core::limits::DEFAULT_BLACKLIST_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Redis connection and key layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL (redis://host:port/db)
    #[serde(default = "default_url")]
    pub url: String,
    /// Password, when not embedded in the URL
    #[serde(default)]
    pub password: Option<String>,
    /// Hash of quota windows, field = project id
    #[serde(default = "default_rate_limits_key")]
    pub rate_limits_key: String,
    /// Set of disabled project ids
    #[serde(default = "default_blocked_projects_key")]
    pub blocked_projects_key: String,
    /// Set of blacklisted addresses
    #[serde(default = "default_blacklist_key")]
    pub blacklist_key: String,
    /// Hash of per-IP hits in the current evaluation period
    #[serde(default = "default_current_period_key")]
    pub current_period_key: String,
    /// Hash of per-IP hits since the beginning of time
    #[serde(default = "default_all_ips_key")]
    pub all_ips_key: String,
    /// Hits per period at which an address gets blacklisted
    #[serde(default = "default_blacklist_threshold")]
    pub blacklist_threshold: u64,
}

fn default_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_rate_limits_key() -> String {
    "rate_limits".to_string()
}

fn default_blocked_projects_key() -> String {
    "DisabledProjectsSet".to_string()
}

fn default_blacklist_key() -> String {
    "BlacklistIPsSet".to_string()
}

fn default_current_period_key() -> String {
    "CurrentPeriodMap".to_string()
}

fn default_all_ips_key() -> String {
    "AllIPsMap".to_string()
}

fn default_blacklist_threshold() -> u64 {
    DEFAULT_BLACKLIST_THRESHOLD
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            password: None,
            rate_limits_key: default_rate_limits_key(),
            blocked_projects_key: default_blocked_projects_key(),
            blacklist_key: default_blacklist_key(),
            current_period_key: default_current_period_key(),
            all_ips_key: default_all_ips_key(),
            blacklist_threshold: default_blacklist_threshold(),
        }
    }
}
