//! Testcontainer setup for Redis.

use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage,
};

/// Redis for tests that need the real quota script.
pub struct TestRedis {
    #[allow(dead_code)]
    container: Option<ContainerAsync<GenericImage>>,
    pub url: String,
}

impl TestRedis {
    /// Start a container, or use `COLLECTOR_TEST_REDIS_URL` when set.
    pub async fn start() -> Self {
        if let Some(url) = std::env::var("COLLECTOR_TEST_REDIS_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            return Self {
                container: None,
                url,
            };
        }

        let container = GenericImage::new("redis", "7-alpine")
            .with_exposed_port(6379.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await
            .expect("Failed to start Redis");

        let port = container.get_host_port_ipv4(6379).await.unwrap();
        Self {
            container: Some(container),
            url: format!("redis://127.0.0.1:{port}"),
        }
    }
}
