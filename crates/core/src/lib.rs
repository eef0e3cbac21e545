//! Core types, token decoding and limit merging for the ingest gateway.

pub mod error;
pub mod limits;
pub mod messages;
pub mod routes;
pub mod settings;
pub mod token;

pub use error::{Error, Rejection, RejectionClass, Result};
pub use messages::*;
pub use routes::RouteTable;
pub use settings::{effective_limits, RateLimitSettings};
pub use token::{IntegrationSecret, LegacyTokenDecoder};
