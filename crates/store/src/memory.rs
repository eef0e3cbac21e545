//! In-process store with the same semantics as [`RedisStore`](crate::RedisStore).
//!
//! A single mutex makes every operation atomic, which is enough for one
//! process. Used by tests and local runs without Redis.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, StoreError};
use crate::store::{IpHits, SharedStore};

#[derive(Debug, Default)]
struct Inner {
    windows: HashMap<String, (i64, u64)>,
    blocked: HashSet<String>,
    current_period: HashMap<String, u64>,
    all_ips: HashMap<String, u64>,
    blacklist: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail, as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub fn block_project(&self, project_id: &str) {
        self.inner.lock().blocked.insert(project_id.to_string());
    }

    pub fn set_window(&self, project_id: &str, start: i64, count: u64) {
        self.inner
            .lock()
            .windows
            .insert(project_id.to_string(), (start, count));
    }

    /// Stored `(windowStart, count)` for a project.
    pub fn window(&self, project_id: &str) -> Option<(i64, u64)> {
        self.inner.lock().windows.get(project_id).copied()
    }

    pub fn set_ip_hits(&self, ip: &str, count: u64) {
        self.inner
            .lock()
            .current_period
            .insert(ip.to_string(), count);
    }

    pub fn current_hits(&self, ip: &str) -> u64 {
        self.inner.lock().current_period.get(ip).copied().unwrap_or(0)
    }

    pub fn total_hits(&self, ip: &str) -> u64 {
        self.inner.lock().all_ips.get(ip).copied().unwrap_or(0)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn check_and_increment(
        &self,
        project_id: &str,
        limit: u64,
        period: u64,
        now: i64,
    ) -> Result<bool> {
        self.check()?;
        let mut inner = self.inner.lock();

        let (mut start, mut count) = inner.windows.get(project_id).copied().unwrap_or((now, 0));
        if now - start >= period as i64 {
            start = now;
            count = 0;
        }
        if count + 1 > limit {
            return Ok(false);
        }

        inner
            .windows
            .insert(project_id.to_string(), (start, count + 1));
        Ok(true)
    }

    async fn blocked_projects(&self) -> Result<HashSet<String>> {
        self.check()?;
        Ok(self.inner.lock().blocked.clone())
    }

    async fn increment_ip(&self, ip: &str) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.lock();
        *inner.current_period.entry(ip.to_string()).or_default() += 1;
        *inner.all_ips.entry(ip.to_string()).or_default() += 1;
        Ok(())
    }

    async fn rotate_ip_counters(&self, threshold: u64) -> Result<Vec<IpHits>> {
        self.check()?;
        let mut inner = self.inner.lock();

        let offenders: Vec<IpHits> = inner
            .current_period
            .drain()
            .filter(|(_, count)| *count >= threshold)
            .map(|(ip, count)| IpHits { ip, count })
            .collect();

        for offender in &offenders {
            inner.blacklist.insert(offender.ip.clone());
        }
        Ok(offenders)
    }

    async fn blacklist(&self) -> Result<HashSet<String>> {
        self.check()?;
        Ok(self.inner.lock().blacklist.clone())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}
