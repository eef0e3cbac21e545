//! Redis implementation of the shared store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo, Script};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::store::{IpHits, SharedStore};

fn load_quota_script() -> Script {
    Script::new(include_str!("rate_limit.lua"))
}

fn load_rotate_script() -> Script {
    Script::new(include_str!("rotate_ips.lua"))
}

/// Shared store backed by a single Redis instance.
///
/// The connection manager multiplexes all callers over one connection and
/// reconnects transparently, so cloning it per call is cheap.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    config: StoreConfig,
    quota_script: Script,
    rotate_script: Script,
}

impl RedisStore {
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let mut info = config.url.as_str().into_connection_info()?;
        if let Some(password) = config.password.as_ref().filter(|p| !p.is_empty()) {
            info.redis.password = Some(password.clone());
        }

        let client = redis::Client::open(info)?;
        let conn = ConnectionManager::new(client).await?;

        info!(url = %config.url, "Connected to Redis");

        Ok(Self {
            conn,
            config,
            quota_script: load_quota_script(),
            rotate_script: load_rotate_script(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn check_and_increment(
        &self,
        project_id: &str,
        limit: u64,
        period: u64,
        now: i64,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();

        let mut invocation = self.quota_script.prepare_invoke();
        invocation
            .key(&self.config.rate_limits_key)
            .arg(project_id)
            .arg(limit)
            .arg(period)
            .arg(now);

        let reply: i64 = invocation.invoke_async(&mut conn).await?;
        match reply {
            1 => Ok(true),
            0 => Ok(false),
            other => Err(StoreError::ScriptReply(other)),
        }
    }

    async fn blocked_projects(&self) -> Result<HashSet<String>> {
        let mut conn = self.conn.clone();
        let ids: HashSet<String> = conn.smembers(&self.config.blocked_projects_key).await?;
        Ok(ids)
    }

    async fn increment_ip(&self, ip: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .hincr(&self.config.current_period_key, ip, 1)
            .ignore()
            .hincr(&self.config.all_ips_key, ip, 1)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn rotate_ip_counters(&self, threshold: u64) -> Result<Vec<IpHits>> {
        let mut conn = self.conn.clone();

        // Blacklist and clear in one script; hits landing meanwhile wait for it.
        let mut invocation = self.rotate_script.prepare_invoke();
        invocation
            .key(&self.config.current_period_key)
            .key(&self.config.blacklist_key)
            .arg(threshold);
        let reply: Vec<String> = invocation.invoke_async(&mut conn).await?;

        let offenders = reply
            .chunks_exact(2)
            .map(|pair| {
                let count = pair[1]
                    .parse()
                    .map_err(|_| StoreError::CounterValue(pair[1].clone()))?;
                Ok(IpHits {
                    ip: pair[0].clone(),
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(offenders = offenders.len(), "Rotated per-IP counters");
        Ok(offenders)
    }

    async fn blacklist(&self) -> Result<HashSet<String>> {
        let mut conn = self.conn.clone();
        let ips: HashSet<String> = conn.smembers(&self.config.blacklist_key).await?;
        Ok(ips)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
