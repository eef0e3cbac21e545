//! Contract of the shared counter/set store.
//!
//! Several gateway replicas share one store, so every mutation here relies
//! on the store's own atomicity rather than on in-process locks.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;

/// Hits recorded for one address during an evaluation period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpHits {
    pub ip: String,
    pub count: u64,
}

#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Atomically advance the quota window of `project_id`.
    ///
    /// Resets the window when `now - start >= period`; returns `false`
    /// without mutating anything when `count + 1 > limit`.
    async fn check_and_increment(
        &self,
        project_id: &str,
        limit: u64,
        period: u64,
        now: i64,
    ) -> Result<bool>;

    /// Full set of disabled project ids.
    async fn blocked_projects(&self) -> Result<HashSet<String>>;

    /// Count one request from `ip` in both the current-period and all-time counters.
    async fn increment_ip(&self, ip: &str) -> Result<()>;

    /// Close the current evaluation period.
    ///
    /// Adds every address with at least `threshold` hits to the blacklist,
    /// then clears the current-period counters and returns the offenders.
    /// When the blacklist update fails the counters are left in place.
    async fn rotate_ip_counters(&self, threshold: u64) -> Result<Vec<IpHits>>;

    /// Full set of blacklisted addresses.
    async fn blacklist(&self) -> Result<HashSet<String>>;

    async fn ping(&self) -> Result<()>;
}
