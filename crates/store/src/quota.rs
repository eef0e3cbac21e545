//! Quota Engine: distributed fixed-window event counter per project.

use chrono::Utc;
use gateway_core::RateLimitSettings;
use std::sync::Arc;
use telemetry::metrics;
use tracing::debug;

use crate::error::Result;
use crate::store::SharedStore;

/// Accepts or rejects one event for a project given its effective limits.
///
/// The check-and-increment runs inside the store, so concurrent callers on
/// any replica never observe the same stale count.
#[derive(Clone)]
pub struct QuotaEngine {
    store: Arc<dyn SharedStore>,
}

impl QuotaEngine {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Try to consume one event from the project's current window.
    ///
    /// `Ok(false)` means the quota is exhausted. `Err` means the store could
    /// not be asked; callers must not treat it as either outcome.
    pub async fn try_consume(&self, project_id: &str, limits: RateLimitSettings) -> Result<bool> {
        self.try_consume_at(project_id, limits, Utc::now().timestamp())
            .await
    }

    pub async fn try_consume_at(
        &self,
        project_id: &str,
        limits: RateLimitSettings,
        now: i64,
    ) -> Result<bool> {
        if limits.is_unlimited() {
            return Ok(true);
        }

        let allowed = self
            .store
            .check_and_increment(project_id, limits.events_limit, limits.events_period, now)
            .await?;

        if !allowed {
            metrics().quota_rejections.inc();
            metrics().quota_rejections_by_project.inc(project_id);
            debug!(
                project_id = %project_id,
                limit = limits.events_limit,
                period = limits.events_period,
                "Quota exhausted"
            );
        }

        Ok(allowed)
    }
}
