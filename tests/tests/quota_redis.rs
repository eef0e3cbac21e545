//! Shared store behavior against a real Redis.
//!
//! Requires Docker for the Redis testcontainer, or `COLLECTOR_TEST_REDIS_URL`.

use gateway_core::RateLimitSettings;
use integration_tests::containers::TestRedis;
use redis::AsyncCommands;
use shared_store::{AbuseDetector, IpHits, QuotaEngine, RedisStore, SharedStore, StoreConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

async fn store(redis: &TestRedis, namespace: &str) -> Arc<RedisStore> {
    let config = StoreConfig {
        url: redis.url.clone(),
        rate_limits_key: format!("{namespace}:rate_limits"),
        blocked_projects_key: format!("{namespace}:blocked"),
        blacklist_key: format!("{namespace}:blacklist"),
        current_period_key: format!("{namespace}:current_period"),
        all_ips_key: format!("{namespace}:all_ips"),
        ..StoreConfig::default()
    };
    Arc::new(RedisStore::connect(config).await.expect("Failed to connect to Redis"))
}

#[tokio::test]
async fn test_concurrent_consumers_never_exceed_limit() {
    let redis = TestRedis::start().await;
    let store = store(&redis, "concurrency").await;
    let quota = QuotaEngine::new(store.clone());
    let limits = RateLimitSettings::new(90, 3600);
    let now = chrono::Utc::now().timestamp();

    let accepted = Arc::new(AtomicU64::new(0));
    let mut tasks = Vec::new();
    for _ in 0..10 {
        let quota = quota.clone();
        let accepted = accepted.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..20 {
                if quota.try_consume_at("project-c", limits, now).await.unwrap() {
                    accepted.fetch_add(1, Ordering::SeqCst);
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(accepted.load(Ordering::SeqCst), 90);
    assert!(!quota.try_consume_at("project-c", limits, now).await.unwrap());
}

#[tokio::test]
async fn test_window_resets_after_period() {
    let redis = TestRedis::start().await;
    let store = store(&redis, "reset").await;
    let quota = QuotaEngine::new(store.clone());
    let limits = RateLimitSettings::new(1, 60);

    assert!(quota.try_consume_at("project-r", limits, 1_000).await.unwrap());
    assert!(!quota.try_consume_at("project-r", limits, 1_059).await.unwrap());
    assert!(quota.try_consume_at("project-r", limits, 1_060).await.unwrap());
}

#[tokio::test]
async fn test_projects_are_counted_separately() {
    let redis = TestRedis::start().await;
    let store = store(&redis, "separate").await;
    let quota = QuotaEngine::new(store.clone());
    let limits = RateLimitSettings::new(1, 60);

    assert!(quota.try_consume_at("a", limits, 5_000).await.unwrap());
    assert!(quota.try_consume_at("b", limits, 5_000).await.unwrap());
    assert!(!quota.try_consume_at("a", limits, 5_001).await.unwrap());
}

#[tokio::test]
async fn test_ip_rotation_blacklists_offenders() {
    let redis = TestRedis::start().await;
    let store = store(&redis, "abuse").await;
    let abuse = AbuseDetector::new(store.clone(), 3);

    for _ in 0..3 {
        store.increment_ip("192.0.2.1").await.unwrap();
    }
    store.increment_ip("192.0.2.2").await.unwrap();

    let offenders = abuse.evaluate().await.unwrap();
    assert_eq!(offenders.len(), 1);
    assert_eq!(offenders[0].ip, "192.0.2.1");
    assert_eq!(offenders[0].count, 3);
    assert!(abuse.is_blacklisted("192.0.2.1"));
    assert!(!abuse.is_blacklisted("192.0.2.2"));

    // Counters for the period are gone after rotation.
    assert!(store.rotate_ip_counters(1).await.unwrap().is_empty());
    assert!(store.blacklist().await.unwrap().contains("192.0.2.1"));
    assert!(store.blocked_projects().await.unwrap().is_empty());
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_failed_blacklist_update_keeps_counters() {
    let redis = TestRedis::start().await;
    let store = store(&redis, "wrongtype").await;
    let client = redis::Client::open(redis.url.as_str()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();

    // A string under the blacklist key makes SADD fail with WRONGTYPE.
    let _: () = conn.del("wrongtype:current_period").await.unwrap();
    let _: () = conn.set("wrongtype:blacklist", "not a set").await.unwrap();

    for _ in 0..3 {
        store.increment_ip("192.0.2.9").await.unwrap();
    }

    let abuse = AbuseDetector::new(store.clone(), 3);
    assert!(abuse.evaluate().await.is_err());
    assert!(!abuse.is_blacklisted("192.0.2.9"));

    let hits: Option<u64> = conn
        .hget("wrongtype:current_period", "192.0.2.9")
        .await
        .unwrap();
    assert_eq!(hits, Some(3));

    let _: () = conn.del("wrongtype:blacklist").await.unwrap();
    let offenders = store.rotate_ip_counters(3).await.unwrap();
    assert_eq!(
        offenders,
        vec![IpHits {
            ip: "192.0.2.9".to_string(),
            count: 3,
        }]
    );
    assert!(store.blacklist().await.unwrap().contains("192.0.2.9"));
}
