//! Project registry access and the snapshot caches built from it.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod limits;
pub mod memory;
pub mod tokens;

pub use client::{PlanRecord, ProjectRecord, Registry, WorkspaceRecord};
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use http::HttpRegistry;
pub use limits::{merge_limits, LimitsCache};
pub use memory::StaticRegistry;
pub use tokens::TokenCache;
