//! Common test setup functions.

use api::{router, Admission, AdmissionConfig, AppState};
use axum::Router;
use axum_test::TestServer;
use broker::PublishPipeline;
use gateway_core::RateLimitSettings;
use registry::{LimitsCache, ProjectRecord, StaticRegistry, TokenCache};
use shared_store::{AbuseDetector, BlockedProjects, MemoryStore, QuotaEngine};
use std::sync::Arc;
use std::time::Duration;
use worker::{Scheduler, WorkerConfig};

use crate::fixtures;
use crate::mocks::{MockNotifier, MockPublisher, PublishedMessage};

pub const PROJECT_ID: &str = "6543a1b2c3d4e5f6a7b8c9d0";
pub const BLACKLIST_THRESHOLD: u64 = 5;

/// Gateway wired the way `main` wires it, with in-memory collaborators.
///
/// - Real router, admission pipeline and publish pipeline
/// - `MemoryStore` in place of Redis, `StaticRegistry` in place of the
///   accounts service
/// - `MockPublisher` capturing what would reach the broker
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<StaticRegistry>,
    pub publisher: Arc<MockPublisher>,
    pub notifier: Arc<MockNotifier>,
    pub tokens: Arc<TokenCache>,
    pub limits: Arc<LimitsCache>,
    pub blocked: Arc<BlockedProjects>,
    pub abuse: Arc<AbuseDetector>,
    pub admission: Arc<Admission>,
    pub scheduler: Arc<Scheduler>,
    pub router: Router,
    /// Token that resolves to [`PROJECT_ID`]
    pub token: String,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(AdmissionConfig::default(), None).await
    }

    pub async fn with_config(config: AdmissionConfig) -> Self {
        Self::build(config, None).await
    }

    pub async fn with_limits(limits: RateLimitSettings) -> Self {
        Self::build(AdmissionConfig::default(), Some(limits)).await
    }

    async fn build(config: AdmissionConfig, limits: Option<RateLimitSettings>) -> Self {
        let token = fixtures::token_for("integration-1");
        let projects: Vec<ProjectRecord> = vec![fixtures::project(PROJECT_ID, &token, limits)];

        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(StaticRegistry::new(projects, Vec::new()));
        let publisher = Arc::new(MockPublisher::new());
        let notifier = Arc::new(MockNotifier::default());

        let tokens = Arc::new(TokenCache::new(registry.clone()));
        let limits = Arc::new(LimitsCache::new(registry.clone()));
        let blocked = Arc::new(BlockedProjects::new(store.clone()));
        let abuse = Arc::new(AbuseDetector::new(store.clone(), BLACKLIST_THRESHOLD));

        let scheduler = Arc::new(Scheduler::new(
            WorkerConfig::default(),
            tokens.clone(),
            limits.clone(),
            blocked.clone(),
            abuse.clone(),
            notifier.clone(),
        ));

        let (handle, _consumer) = PublishPipeline::start(publisher.clone());
        let admission = Arc::new(Admission::new(
            config,
            tokens.clone(),
            limits.clone(),
            blocked.clone(),
            QuotaEngine::new(store.clone()),
            handle,
        ));

        let state = AppState::new(
            admission.clone(),
            store.clone(),
            registry.clone(),
            publisher.clone(),
            abuse.clone(),
        );

        let ctx = Self {
            store,
            registry,
            publisher,
            notifier,
            tokens,
            limits,
            blocked,
            abuse,
            admission,
            scheduler,
            router: router(state),
            token,
        };
        ctx.refresh().await;
        ctx
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Run every refresher once, like the background tasks would.
    pub async fn refresh(&self) {
        self.tokens.refresh().await.expect("token refresh");
        self.limits.refresh().await.expect("limits refresh");
        self.blocked.refresh().await.expect("blocked refresh");
        self.abuse.reload_blacklist().await.expect("blacklist reload");
    }

    /// Block the test project and reload the blocked set.
    pub async fn block_project(&self) {
        self.store.block_project(PROJECT_ID);
        self.blocked.refresh().await.expect("blocked refresh");
    }

    /// Wait until the publisher has seen `n` messages.
    pub async fn published(&self, n: usize) -> Vec<PublishedMessage> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.publisher.count() < n {
            if tokio::time::Instant::now() > deadline {
                panic!(
                    "expected {n} published messages, got {}",
                    self.publisher.count()
                );
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.publisher.messages()
    }

    /// Give the publish consumer time to drain, then report what it saw.
    pub async fn settle(&self) -> Vec<PublishedMessage> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.publisher.messages()
    }
}
