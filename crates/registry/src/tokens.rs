//! Token Resolver Cache.
//!
//! Holds an immutable `IntegrationSecret -> ProjectID` map behind an
//! [`ArcSwap`]. Readers load the current snapshot without locking; a refresh
//! builds a whole new map and swaps it in, so nobody ever sees a half-built
//! one.

use arc_swap::ArcSwap;
use gateway_core::IntegrationSecret;
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{debug, trace, warn};

use crate::client::{ProjectRecord, Registry};
use crate::error::Result;

pub type TokenSnapshot = HashMap<String, String>;

pub struct TokenCache {
    registry: Arc<dyn Registry>,
    snapshot: ArcSwap<TokenSnapshot>,
}

impl TokenCache {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            snapshot: ArcSwap::from_pointee(TokenSnapshot::new()),
        }
    }

    /// Project id for a client-supplied integration token.
    ///
    /// Tokens that fail to decode resolve to nothing.
    pub fn resolve(&self, token: &str) -> Option<String> {
        let secret = IntegrationSecret::decode(token).ok()?;
        self.snapshot.load().get(secret.as_str()).cloned()
    }

    pub fn snapshot(&self) -> Arc<TokenSnapshot> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the snapshot from the registry.
    ///
    /// On error the previous snapshot is kept and the error returned for
    /// the caller to log.
    pub async fn refresh(&self) -> Result<usize> {
        debug!("Refreshing token cache");
        let projects = self.registry.list_projects().await?;

        let snapshot = build_snapshot(&projects);
        let count = snapshot.len();
        self.snapshot.store(Arc::new(snapshot));

        metrics().cached_tokens.set(count as u64);
        debug!(tokens = count, "Token cache refreshed");
        Ok(count)
    }
}

fn build_snapshot(projects: &[ProjectRecord]) -> TokenSnapshot {
    let mut snapshot = TokenSnapshot::with_capacity(projects.len());
    for project in projects {
        match IntegrationSecret::decode(&project.token) {
            Ok(secret) => {
                snapshot.insert(secret.as_str().to_string(), project.id.clone());
            }
            Err(e) => {
                warn!(project_id = %project.id, error = %e, "Skipping project with invalid integration token");
            }
        }
    }
    trace!(?snapshot, "Token cache state");
    snapshot
}
