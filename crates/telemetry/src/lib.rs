//! Internal telemetry for the ingest gateway.
//!
//! Structured logging setup, lock-free counters and component health.
//! Metrics are exposed as a JSON snapshot by the API crate.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
