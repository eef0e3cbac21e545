//! Background tasks for the ingest gateway.
//!
//! - Token resolver and project limits cache refreshers
//! - Blocked projects reload
//! - Abuse cycle (blacklisting plus alerts)
//! - Startup warm-up with backoff

pub mod config;
pub mod notifications;
pub mod runner;
pub mod scheduler;

pub use config::WorkerConfig;
pub use notifications::{notifier_from_url, AlertNotifier, LogNotifier, NotifyError, WebhookNotifier};
pub use runner::{run_periodically, warm_up, warm_up_backoff};
pub use scheduler::{Scheduler, WorkerError};
