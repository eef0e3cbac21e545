//! Read contract of the project registry.
//!
//! The registry owns projects, workspaces and tariff plans. The gateway only
//! ever lists all of them to rebuild its caches.

use async_trait::async_trait;
use gateway_core::RateLimitSettings;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    /// Integration token as handed out to the project's catchers
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub rate_limit_settings: Option<RateLimitSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rate_limit_settings: Option<RateLimitSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    pub id: String,
    #[serde(default)]
    pub plan: Option<PlanRecord>,
    #[serde(default)]
    pub rate_limit_settings: Option<RateLimitSettings>,
}

#[async_trait]
pub trait Registry: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>>;

    /// Workspaces with their tariff plan joined in.
    async fn list_workspaces(&self) -> Result<Vec<WorkspaceRecord>>;

    async fn ping(&self) -> Result<()>;
}
