//! Internal metrics collection.
//!
//! Everything is an atomic so the admission hot path never takes a lock,
//! except the first increment of a new label in [`LabeledCounter`].

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Counter partitioned by a single label (project id).
#[derive(Debug, Default)]
pub struct LabeledCounter {
    values: RwLock<HashMap<String, AtomicU64>>,
}

impl LabeledCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, label: &str) {
        if let Some(counter) = self.values.read().get(label) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.values
            .write()
            .entry(label.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, label: &str) -> u64 {
        self.values
            .read()
            .get(label)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the gateway.
#[derive(Debug, Default)]
pub struct Metrics {
    // Accepted submissions
    pub errors_processed: Counter,
    pub performance_processed: Counter,
    pub sentry_processed: Counter,
    pub releases_processed: Counter,

    // Policy rejections
    pub errors_blocked_by_limit: Counter,
    pub performance_blocked_by_limit: Counter,
    pub quota_rejections: Counter,
    pub quota_rejections_by_project: LabeledCounter,

    // Client and dependency failures
    pub client_rejections: Counter,
    pub quota_store_errors: Counter,
    pub blacklisted_requests: Counter,
    pub ip_counter_errors: Counter,

    // Publish pipeline
    pub messages_published: Counter,
    pub publish_errors: Counter,

    // Latency histograms
    pub admission_latency_ms: Histogram,
    pub publish_latency_ms: Histogram,

    // Gauges
    pub cached_tokens: Gauge,
    pub cached_project_limits: Gauge,
    pub blocked_projects: Gauge,
    pub blacklisted_ips: Gauge,
    pub active_ws_connections: Gauge,
    pub publish_waiting: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub errors_processed: u64,
    pub performance_processed: u64,
    pub sentry_processed: u64,
    pub releases_processed: u64,
    pub errors_blocked_by_limit: u64,
    pub performance_blocked_by_limit: u64,
    pub quota_rejections: u64,
    pub quota_rejections_by_project: BTreeMap<String, u64>,
    pub client_rejections: u64,
    pub quota_store_errors: u64,
    pub blacklisted_requests: u64,
    pub ip_counter_errors: u64,
    pub messages_published: u64,
    pub publish_errors: u64,
    pub admission_latency_mean_ms: f64,
    pub publish_latency_mean_ms: f64,
    pub cached_tokens: u64,
    pub cached_project_limits: u64,
    pub blocked_projects: u64,
    pub blacklisted_ips: u64,
    pub active_ws_connections: u64,
    pub publish_waiting: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            errors_processed: self.errors_processed.get(),
            performance_processed: self.performance_processed.get(),
            sentry_processed: self.sentry_processed.get(),
            releases_processed: self.releases_processed.get(),
            errors_blocked_by_limit: self.errors_blocked_by_limit.get(),
            performance_blocked_by_limit: self.performance_blocked_by_limit.get(),
            quota_rejections: self.quota_rejections.get(),
            quota_rejections_by_project: self.quota_rejections_by_project.snapshot(),
            client_rejections: self.client_rejections.get(),
            quota_store_errors: self.quota_store_errors.get(),
            blacklisted_requests: self.blacklisted_requests.get(),
            ip_counter_errors: self.ip_counter_errors.get(),
            messages_published: self.messages_published.get(),
            publish_errors: self.publish_errors.get(),
            admission_latency_mean_ms: self.admission_latency_ms.mean(),
            publish_latency_mean_ms: self.publish_latency_ms.mean(),
            cached_tokens: self.cached_tokens.get(),
            cached_project_limits: self.cached_project_limits.get(),
            blocked_projects: self.blocked_projects.get(),
            blacklisted_ips: self.blacklisted_ips.get(),
            active_ws_connections: self.active_ws_connections.get(),
            publish_waiting: self.publish_waiting.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
