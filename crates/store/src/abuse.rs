//! Abuse Detector: per-IP hit counting and periodic blacklisting.

use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::{IpHits, SharedStore};

pub struct AbuseDetector {
    store: Arc<dyn SharedStore>,
    blacklist: ArcSwap<HashSet<String>>,
    threshold: u64,
}

impl AbuseDetector {
    pub fn new(store: Arc<dyn SharedStore>, threshold: u64) -> Self {
        Self {
            store,
            blacklist: ArcSwap::from_pointee(HashSet::new()),
            threshold,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn is_blacklisted(&self, ip: &str) -> bool {
        self.blacklist.load().contains(ip)
    }

    /// Count a request from `ip` without delaying the caller.
    ///
    /// Store failures are logged and counted; the request is never affected.
    pub fn record_hit(&self, ip: &str) {
        let store = Arc::clone(&self.store);
        let ip = ip.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.increment_ip(&ip).await {
                metrics().ip_counter_errors.inc();
                warn!(ip = %ip, error = %e, "Failed to increment IP counter");
            }
        });
    }

    /// Replace the local blacklist copy. On error the previous copy stays.
    pub async fn reload_blacklist(&self) -> Result<usize> {
        let ips = self.store.blacklist().await?;
        let count = ips.len();
        self.blacklist.store(Arc::new(ips));
        metrics().blacklisted_ips.set(count as u64);
        Ok(count)
    }

    /// Close the evaluation period and return the newly blacklisted addresses.
    ///
    /// The local copy is reloaded before returning, so callers can notify
    /// knowing the block is already in effect on this replica.
    pub async fn evaluate(&self) -> Result<Vec<IpHits>> {
        let offenders = self.store.rotate_ip_counters(self.threshold).await?;

        if let Err(e) = self.reload_blacklist().await {
            warn!(error = %e, "Failed to reload blacklist after rotation");
        }

        if !offenders.is_empty() {
            info!(
                count = offenders.len(),
                threshold = self.threshold,
                "Blacklisted addresses over threshold"
            );
        }
        Ok(offenders)
    }
}
