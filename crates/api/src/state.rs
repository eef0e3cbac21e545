//! Application state shared across handlers.

use broker::Publisher;
use registry::Registry;
use shared_store::{AbuseDetector, SharedStore};
use std::sync::Arc;

use crate::admission::Admission;
use crate::config::AdmissionConfig;

#[derive(Clone)]
pub struct AppState {
    pub admission: Arc<Admission>,
    /// Shared store, pinged by the health endpoint
    pub store: Arc<dyn SharedStore>,
    /// Project registry, pinged by the health endpoint
    pub registry: Arc<dyn Registry>,
    pub publisher: Arc<dyn Publisher>,
    pub abuse: Arc<AbuseDetector>,
}

impl AppState {
    pub fn new(
        admission: Arc<Admission>,
        store: Arc<dyn SharedStore>,
        registry: Arc<dyn Registry>,
        publisher: Arc<dyn Publisher>,
        abuse: Arc<AbuseDetector>,
    ) -> Self {
        Self {
            admission,
            store,
            registry,
            publisher,
            abuse,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        self.admission.config()
    }
}
