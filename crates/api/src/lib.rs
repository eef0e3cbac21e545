//! HTTP and WebSocket transport adapters in front of the admission pipeline.

pub mod admission;
pub mod config;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use admission::Admission;
pub use config::AdmissionConfig;
pub use response::ApiResponse;
pub use routes::router;
pub use state::AppState;
