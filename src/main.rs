//! Ingest Gateway
//!
//! Admission control in front of the event broker:
//! - Error, performance, Sentry and release submissions over HTTP and WebSocket
//! - Token resolution and per-project limits from the project registry
//! - Fixed-window quotas, blocked projects and the IP blacklist in Redis
//! - Single-consumer publish pipeline to a Kafka-compatible broker

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use api::{router, Admission, AdmissionConfig, AppState};
use broker::{health::check_broker, BrokerConfig, KafkaPublisher, PublishPipeline, Publisher};
use registry::{HttpRegistry, LimitsCache, Registry, RegistryConfig, TokenCache};
use shared_store::{
    AbuseDetector, BlockedProjects, QuotaEngine, RedisStore, SharedStore, StoreConfig,
};
use telemetry::{health, init_tracing_from_env};
use worker::{notifier_from_url, warm_up_backoff, Scheduler, WorkerConfig};

/// How long shutdown waits for the publish queue to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_listen")]
    listen: String,

    #[serde(default)]
    redis: StoreConfig,

    #[serde(default)]
    registry: RegistryConfig,

    #[serde(default)]
    broker: BrokerConfig,

    #[serde(default)]
    admission: AdmissionConfig,

    #[serde(default)]
    worker: WorkerConfig,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            redis: StoreConfig::default(),
            registry: RegistryConfig::default(),
            broker: BrokerConfig::default(),
            admission: AdmissionConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // rustls 0.23 needs an explicit crypto provider before any TLS handshake
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing_from_env();

    info!("Starting Ingest Gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        listen = %config.listen,
        brokers = ?config.broker.brokers,
        registry = %config.registry.url,
        legacy_tokens = config.admission.allow_legacy_tokens,
        "Loaded configuration"
    );

    let store: Arc<dyn SharedStore> = Arc::new(
        RedisStore::connect(config.redis.clone())
            .await
            .context("Failed to connect to Redis")?,
    );

    let registry: Arc<dyn Registry> = Arc::new(
        HttpRegistry::new(&config.registry).context("Failed to create registry client")?,
    );

    let publisher: Arc<dyn Publisher> = Arc::new(
        KafkaPublisher::connect(config.broker.clone())
            .await
            .context("Failed to connect to broker")?,
    );

    check_health(&store, &registry, &publisher).await;

    let tokens = Arc::new(TokenCache::new(registry.clone()));
    let limits = Arc::new(LimitsCache::new(registry.clone()));
    let blocked = Arc::new(BlockedProjects::new(store.clone()));
    let abuse = Arc::new(AbuseDetector::new(
        store.clone(),
        config.redis.blacklist_threshold,
    ));

    let scheduler = Arc::new(Scheduler::new(
        config.worker.clone(),
        tokens.clone(),
        limits.clone(),
        blocked.clone(),
        abuse.clone(),
        notifier_from_url(config.worker.notify_url.as_deref()),
    ));
    scheduler
        .warm_up(warm_up_backoff)
        .await
        .context("Warm-up failed")?;

    let cancel = CancellationToken::new();
    let worker_handles = scheduler.start(cancel.clone());

    let (publish_handle, consumer) = PublishPipeline::start(publisher.clone());

    let admission = Arc::new(Admission::new(
        config.admission.clone(),
        tokens,
        limits,
        blocked,
        QuotaEngine::new(store.clone()),
        publish_handle,
    ));
    let state = AppState::new(admission, store, registry, publisher, abuse);
    let app = router(state);

    let addr: SocketAddr = config
        .listen
        .parse()
        .context("Invalid listen address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down...");

    cancel.cancel();
    for handle in worker_handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Background task ended abnormally");
        }
    }

    // The consumer exits once the last publish handle is gone; open
    // WebSocket sessions may still hold one until they close.
    match tokio::time::timeout(DRAIN_TIMEOUT, consumer).await {
        Ok(Ok(())) => info!("Publish queue drained"),
        Ok(Err(e)) => error!(error = %e, "Publish consumer ended abnormally"),
        Err(_) => warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Publish queue did not drain in time"
        ),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("COLLECTOR")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    apply_flat_overrides(&mut config)?;
    Ok(config)
}

/// Flat variables from deployment `.env` files win over everything else.
fn apply_flat_overrides(config: &mut Config) -> Result<()> {
    if let Ok(listen) = std::env::var("LISTEN") {
        config.listen = listen;
    }
    if let Ok(url) = std::env::var("REDIS_URL") {
        config.redis.url = url;
    }
    if let Ok(password) = std::env::var("REDIS_PASSWORD") {
        config.redis.password = Some(password);
    }
    if let Ok(key) = std::env::var("REDIS_DISABLED_PROJECT_SET") {
        config.redis.blocked_projects_key = key;
    }
    if let Ok(brokers) = std::env::var("BROKER_URL") {
        config.broker.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Ok(url) = std::env::var("REGISTRY_URL") {
        config.registry.url = url;
    }
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        config.admission.jwt_secret = Some(secret);
    }
    if let Ok(url) = std::env::var("NOTIFY_URL") {
        config.worker.notify_url = Some(url);
    }
    if let Ok(size) = std::env::var("MAX_ERROR_CATCHER_MESSAGE_SIZE") {
        config.admission.max_error_message_bytes = size
            .parse()
            .context("MAX_ERROR_CATCHER_MESSAGE_SIZE must be a byte count")?;
    }
    if let Ok(size) = std::env::var("MAX_RELEASE_CATCHER_MESSAGE_SIZE") {
        config.admission.max_release_message_bytes = size
            .parse()
            .context("MAX_RELEASE_CATCHER_MESSAGE_SIZE must be a byte count")?;
    }
    Ok(())
}

/// Check component health on startup.
async fn check_health(
    store: &Arc<dyn SharedStore>,
    registry: &Arc<dyn Registry>,
    publisher: &Arc<dyn Publisher>,
) {
    match store.ping().await {
        Ok(()) => {
            health().redis.set_healthy();
            info!("Redis connection: healthy");
        }
        Err(e) => {
            health().redis.set_unhealthy(e.to_string());
            error!(error = %e, "Redis connection: unhealthy");
        }
    }

    match registry.ping().await {
        Ok(()) => {
            health().registry.set_healthy();
            info!("Registry connection: healthy");
        }
        Err(e) => {
            health().registry.set_unhealthy(e.to_string());
            error!(error = %e, "Registry connection: unhealthy");
        }
    }

    if check_broker(publisher).await {
        info!("Broker connection: healthy");
    } else {
        error!("Broker connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
