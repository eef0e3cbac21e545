//! Scheduler for the gateway's background tasks.

use backoff::ExponentialBackoff;
use registry::{LimitsCache, RegistryError, TokenCache};
use shared_store::{AbuseDetector, BlockedProjects, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::notifications::{blacklist_alert, AlertNotifier, NotifyError};
use crate::runner::{run_periodically, warm_up};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Everything refreshed in the background, shared with the request path.
pub struct Scheduler {
    config: WorkerConfig,
    tokens: Arc<TokenCache>,
    limits: Arc<LimitsCache>,
    blocked: Arc<BlockedProjects>,
    abuse: Arc<AbuseDetector>,
    notifier: Arc<dyn AlertNotifier>,
}

impl Scheduler {
    pub fn new(
        config: WorkerConfig,
        tokens: Arc<TokenCache>,
        limits: Arc<LimitsCache>,
        blocked: Arc<BlockedProjects>,
        abuse: Arc<AbuseDetector>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            config,
            tokens,
            limits,
            blocked,
            abuse,
            notifier,
        }
    }

    /// Load state before serving.
    ///
    /// The blocked-projects set and the blacklist are retried, each with a
    /// fresh policy from `backoff`, and fail startup if they never load. The caches get one attempt each;
    /// their timers will catch up.
    pub async fn warm_up<B>(&self, backoff: B) -> Result<(), WorkerError>
    where
        B: Fn() -> ExponentialBackoff,
    {
        let blocked = warm_up("blocked_projects", backoff(), || self.blocked.refresh()).await?;
        let blacklisted =
            warm_up("blacklist", backoff(), || self.abuse.reload_blacklist()).await?;

        let tokens = self
            .tokens
            .refresh()
            .await
            .map_err(|e| warn!(error = %e, "Initial token cache refresh failed"))
            .unwrap_or(0);
        let limits = self
            .limits
            .refresh()
            .await
            .map_err(|e| warn!(error = %e, "Initial limits cache refresh failed"))
            .unwrap_or(0);

        info!(
            blocked_projects = blocked,
            blacklisted_ips = blacklisted,
            tokens = tokens,
            project_limits = limits,
            "Warm-up complete"
        );
        Ok(())
    }

    /// Run one abuse cycle: blacklist offenders, then alert about each.
    ///
    /// The first failed alert stops the remaining ones; the blacklist update
    /// has already happened by then.
    pub async fn abuse_cycle(&self) -> Result<usize, WorkerError> {
        let offenders = self.abuse.evaluate().await?;

        for offender in &offenders {
            let message = blacklist_alert(&self.config.alert_title, &offender.ip, offender.count);
            if let Err(e) = self.notifier.notify(&message).await {
                error!(ip = %offender.ip, error = %e, "Failed to send blacklist alert");
                return Err(e.into());
            }
        }

        Ok(offenders.len())
    }

    /// Spawn all periodic tasks. They stop when `cancel` fires.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let tokens = self.tokens.clone();
        handles.push(tokio::spawn(run_periodically(
            "token_cache",
            self.config.tokens_interval(),
            cancel.clone(),
            move || {
                let tokens = tokens.clone();
                async move { tokens.refresh().await }
            },
        )));

        let limits = self.limits.clone();
        handles.push(tokio::spawn(run_periodically(
            "limits_cache",
            self.config.limits_interval(),
            cancel.clone(),
            move || {
                let limits = limits.clone();
                async move { limits.refresh().await }
            },
        )));

        let blocked = self.blocked.clone();
        handles.push(tokio::spawn(run_periodically(
            "blocked_projects",
            self.config.blocked_interval(),
            cancel.clone(),
            move || {
                let blocked = blocked.clone();
                async move { blocked.refresh().await }
            },
        )));

        let scheduler = self.clone();
        handles.push(tokio::spawn(run_periodically(
            "abuse_cycle",
            self.config.blacklist_interval(),
            cancel,
            move || {
                let scheduler = scheduler.clone();
                async move { scheduler.abuse_cycle().await }
            },
        )));

        info!(tasks = handles.len(), "Background tasks started");
        handles
    }
}
