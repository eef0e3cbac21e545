//! Admission and transport configuration.

use gateway_core::limits::{
    MAX_ERROR_MESSAGE_BYTES, MAX_PERFORMANCE_MESSAGE_BYTES, MAX_RELEASE_MESSAGE_BYTES,
    WS_IDLE_TIMEOUT_SECS, WS_PING_PERIOD_SECS,
};
use gateway_core::{Category, RouteTable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default = "default_max_error_bytes")]
    pub max_error_message_bytes: usize,
    #[serde(default = "default_max_performance_bytes")]
    pub max_performance_message_bytes: usize,
    #[serde(default = "default_max_release_bytes")]
    pub max_release_message_bytes: usize,
    #[serde(default)]
    pub routes: RouteTable,
    /// Accept HS256 JWT tokens that do not resolve through the token cache
    #[serde(default)]
    pub allow_legacy_tokens: bool,
    /// Secret for legacy JWT tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_ws_idle_timeout")]
    pub ws_idle_timeout_secs: u64,
    #[serde(default = "default_ws_ping_period")]
    pub ws_ping_period_secs: u64,
}

fn default_max_error_bytes() -> usize {
    MAX_ERROR_MESSAGE_BYTES
}

fn default_max_performance_bytes() -> usize {
    MAX_PERFORMANCE_MESSAGE_BYTES
}

fn default_max_release_bytes() -> usize {
    MAX_RELEASE_MESSAGE_BYTES
}

fn default_ws_idle_timeout() -> u64 {
    WS_IDLE_TIMEOUT_SECS
}

fn default_ws_ping_period() -> u64 {
    WS_PING_PERIOD_SECS
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_error_message_bytes: default_max_error_bytes(),
            max_performance_message_bytes: default_max_performance_bytes(),
            max_release_message_bytes: default_max_release_bytes(),
            routes: RouteTable::default(),
            allow_legacy_tokens: false,
            jwt_secret: None,
            ws_idle_timeout_secs: default_ws_idle_timeout(),
            ws_ping_period_secs: default_ws_ping_period(),
        }
    }
}

impl AdmissionConfig {
    /// Size limit for one submission. Sentry envelopes share the error limit.
    pub fn max_bytes(&self, category: Category) -> usize {
        match category {
            Category::Errors | Category::Sentry => self.max_error_message_bytes,
            Category::Performance => self.max_performance_message_bytes,
            Category::Release => self.max_release_message_bytes,
        }
    }

    /// Router-wide body cap: the largest per-category limit.
    pub fn max_request_body(&self) -> usize {
        self.max_error_message_bytes
            .max(self.max_performance_message_bytes)
            .max(self.max_release_message_bytes)
    }

    /// Largest WebSocket frame: frames carry errors or performance only.
    pub fn max_frame_bytes(&self) -> usize {
        self.max_error_message_bytes
            .max(self.max_performance_message_bytes)
    }

    pub fn ws_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_idle_timeout_secs.max(1))
    }

    pub fn ws_ping_period(&self) -> Duration {
        Duration::from_secs(self.ws_ping_period_secs.max(1))
    }
}
