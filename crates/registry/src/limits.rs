//! Project Limits Cache: effective `ProjectID -> RateLimitSettings`.

use arc_swap::ArcSwap;
use gateway_core::{effective_limits, RateLimitSettings};
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{debug, trace};

use crate::client::{ProjectRecord, Registry, WorkspaceRecord};
use crate::error::Result;

pub type LimitsSnapshot = HashMap<String, RateLimitSettings>;

pub struct LimitsCache {
    registry: Arc<dyn Registry>,
    snapshot: ArcSwap<LimitsSnapshot>,
}

impl LimitsCache {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            snapshot: ArcSwap::from_pointee(LimitsSnapshot::new()),
        }
    }

    pub fn limits_for(&self, project_id: &str) -> Option<RateLimitSettings> {
        self.snapshot.load().get(project_id).copied()
    }

    pub fn snapshot(&self) -> Arc<LimitsSnapshot> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild from workspaces (with plans) and projects. Fail-soft like
    /// [`TokenCache::refresh`](crate::TokenCache::refresh).
    pub async fn refresh(&self) -> Result<usize> {
        debug!("Refreshing project limits cache");
        let workspaces = self.registry.list_workspaces().await?;
        let projects = self.registry.list_projects().await?;

        let snapshot = merge_limits(&projects, &workspaces);
        let count = snapshot.len();
        self.snapshot.store(Arc::new(snapshot));

        metrics().cached_project_limits.set(count as u64);
        debug!(projects = count, "Project limits cache refreshed");
        Ok(count)
    }
}

/// Plan, then non-zero workspace fields, then non-zero project fields.
pub fn merge_limits(projects: &[ProjectRecord], workspaces: &[WorkspaceRecord]) -> LimitsSnapshot {
    let by_id: HashMap<&str, &WorkspaceRecord> =
        workspaces.iter().map(|w| (w.id.as_str(), w)).collect();

    let mut snapshot = LimitsSnapshot::with_capacity(projects.len());
    for project in projects {
        let workspace = project
            .workspace_id
            .as_deref()
            .and_then(|id| by_id.get(id).copied());

        let plan = workspace
            .and_then(|w| w.plan.as_ref())
            .and_then(|p| p.rate_limit_settings.as_ref());

        let limits = effective_limits(
            plan,
            workspace.and_then(|w| w.rate_limit_settings.as_ref()),
            project.rate_limit_settings.as_ref(),
        );
        trace!(project_id = %project.id, ?limits, "Effective limits");
        snapshot.insert(project.id.clone(), limits);
    }
    snapshot
}
