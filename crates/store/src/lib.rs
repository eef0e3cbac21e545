//! Shared store: quota windows, blocked projects and per-IP abuse counters.
//!
//! All gateway replicas talk to the same Redis instance, so every counter
//! here is advanced atomically on the store side.

pub mod abuse;
pub mod blocked;
pub mod config;
pub mod error;
pub mod memory;
pub mod quota;
pub mod redis_store;
pub mod store;

pub use abuse::AbuseDetector;
pub use blocked::BlockedProjects;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use quota::QuotaEngine;
pub use redis_store::RedisStore;
pub use store::{IpHits, SharedStore};
