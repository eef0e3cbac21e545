//! Blocked Projects Set.

use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::sync::Arc;
use telemetry::metrics;
use tracing::debug;

use crate::error::Result;
use crate::store::SharedStore;

/// In-memory copy of the disabled-projects set, replaced wholesale on refresh.
pub struct BlockedProjects {
    store: Arc<dyn SharedStore>,
    ids: ArcSwap<HashSet<String>>,
}

impl BlockedProjects {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            store,
            ids: ArcSwap::from_pointee(HashSet::new()),
        }
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.ids.load().contains(project_id)
    }

    pub fn len(&self) -> usize {
        self.ids.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reload the set. On error the previous copy stays in place.
    pub async fn refresh(&self) -> Result<usize> {
        let ids = self.store.blocked_projects().await?;
        let count = ids.len();
        let previous = self.ids.swap(Arc::new(ids));

        if previous.len() != count {
            debug!(
                before = previous.len(),
                after = count,
                "Blocked projects list changed"
            );
        }
        metrics().blocked_projects.set(count as u64);
        Ok(count)
    }
}
