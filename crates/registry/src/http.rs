//! HTTP client for the accounts service.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::{ProjectRecord, Registry, WorkspaceRecord};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// Registry backed by the accounts service's internal listing endpoints:
/// `GET {url}/projects`, `GET {url}/workspaces` and `GET {url}/health`.
#[derive(Clone)]
pub struct HttpRegistry {
    base_url: String,
    api_token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            http_client,
        })
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Calling registry");

        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Registry request failed");
            RegistryError::from(e)
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status, body = %body, "Registry returned error");
            return Err(RegistryError::Status { status, body });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        response.json().await.map_err(|e| {
            warn!(error = %e, path = path, "Failed to parse registry response");
            RegistryError::from(e)
        })
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        self.get_json("projects").await
    }

    async fn list_workspaces(&self) -> Result<Vec<WorkspaceRecord>> {
        self.get_json("workspaces").await
    }

    async fn ping(&self) -> Result<()> {
        self.get("health").await.map(|_| ())
    }
}
