//! Registry client configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Accounts service base URL (e.g., "http://accounts:4000/internal")
    #[serde(default = "default_url")]
    pub url: String,
    /// Bearer token sent to the accounts service, if it requires one
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:4000/internal".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
