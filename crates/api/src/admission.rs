//! Admission Pipeline.
//!
//! Every transport adapter ends up here with a [`CanonicalSubmission`]:
//! resolve the token, check the blocked set, consume quota, validate the
//! payload, build the broker message and hand it to the publish pipeline.
//! Each step either passes or produces a terminal [`Rejection`].

use broker::PublishHandle;
use chrono::Utc;
use gateway_core::{
    stamp_timestamp, BrokerMessage, CanonicalSubmission, CatcherMessage, Category,
    IntegrationSecret, LegacyTokenDecoder, RateLimitSettings, Rejection, ReleasePayload,
    ADD_RELEASE_TYPE,
};
use registry::{LimitsCache, TokenCache};
use serde_json::value::RawValue;
use shared_store::{BlockedProjects, QuotaEngine};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, warn};

use crate::config::AdmissionConfig;

pub struct Admission {
    config: AdmissionConfig,
    tokens: Arc<TokenCache>,
    limits: Arc<LimitsCache>,
    blocked: Arc<BlockedProjects>,
    quota: QuotaEngine,
    publisher: PublishHandle,
    legacy: Option<LegacyTokenDecoder>,
}

impl Admission {
    pub fn new(
        config: AdmissionConfig,
        tokens: Arc<TokenCache>,
        limits: Arc<LimitsCache>,
        blocked: Arc<BlockedProjects>,
        quota: QuotaEngine,
        publisher: PublishHandle,
    ) -> Self {
        let legacy = match (config.allow_legacy_tokens, config.jwt_secret.as_deref()) {
            (true, Some(secret)) if !secret.is_empty() => Some(LegacyTokenDecoder::new(secret)),
            (true, _) => {
                warn!("Legacy tokens enabled without a JWT secret, ignoring");
                None
            }
            _ => None,
        };

        Self {
            config,
            tokens,
            limits,
            blocked,
            quota,
            publisher,
            legacy,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn check_size(&self, category: Category, len: usize) -> Result<(), Rejection> {
        let max = self.config.max_bytes(category);
        if len > max {
            warn!(category = category.as_str(), size = len, max = max, "Submission too large");
            return Err(Rejection::TooLarge);
        }
        Ok(())
    }

    /// Full pipeline for a JSON catcher message of a known category.
    pub async fn submit(
        &self,
        category: Category,
        body: &[u8],
        remote_ip: Option<String>,
    ) -> Result<(), Rejection> {
        self.check_size(category, body.len())?;
        let submission = CatcherMessage::parse(body)?.into_submission(category, remote_ip)?;
        self.admit(submission).await
    }

    /// Full pipeline for a WebSocket frame; the category comes from the
    /// catcher type prefix.
    ///
    /// The size limit is checked before parsing: the category cap when the
    /// catcher type can be read off the raw frame, the largest frame cap
    /// otherwise.
    pub async fn submit_frame(
        &self,
        body: &[u8],
        remote_ip: Option<String>,
    ) -> Result<(), Rejection> {
        match CatcherMessage::peek_catcher_type(body).and_then(Category::from_catcher_type) {
            Some(category) => self.check_size(category, body.len())?,
            None if body.len() > self.config.max_frame_bytes() => {
                warn!(size = body.len(), max = self.config.max_frame_bytes(), "Frame too large");
                return Err(Rejection::TooLarge);
            }
            None => {}
        }

        let message = CatcherMessage::parse(body)?;
        if message.catcher_type.is_empty() {
            return Err(Rejection::EmptyCatcherType);
        }
        let category = Category::from_catcher_type(&message.catcher_type).ok_or_else(|| {
            Rejection::malformed(format!("Unknown catcher type: {}", message.catcher_type))
        })?;

        self.check_size(category, body.len())?;
        self.admit(message.into_submission(category, remote_ip)?)
            .await
    }

    /// Steps from token resolution to enqueue.
    pub async fn admit(&self, submission: CanonicalSubmission) -> Result<(), Rejection> {
        let start = Instant::now();
        let category = submission.category;

        let project_id = self.resolve_project(&submission.token)?;
        self.check_blocked(category, &project_id)?;

        if category.is_metered() {
            self.consume_quota(&project_id).await?;
        }

        let message = self.build_message(&submission, project_id)?;
        self.enqueue(message).await?;

        match category {
            Category::Errors => metrics().errors_processed.inc(),
            Category::Performance => metrics().performance_processed.inc(),
            Category::Sentry => metrics().sentry_processed.inc(),
            Category::Release => metrics().releases_processed.inc(),
        }
        metrics()
            .admission_latency_ms
            .observe(start.elapsed().as_millis() as u64);
        Ok(())
    }

    /// Releases are checked against the blocked set but do not consume quota.
    pub async fn admit_release(&self, token: &str, payload: ReleasePayload) -> Result<(), Rejection> {
        if self.legacy.is_none() && IntegrationSecret::decode(token).is_err() {
            debug!("Release token failed to decode");
            return Err(Rejection::malformed("Token decoding error"));
        }

        let project_id = self.resolve_project(token)?;
        self.check_blocked(Category::Release, &project_id)?;

        let payload = serde_json::value::to_raw_value(&payload).map_err(|e| {
            error!(error = %e, "Failed to serialize release payload");
            Rejection::malformed("Cannot encode release")
        })?;

        let message = BrokerMessage {
            route: self.config.routes.release_route.clone(),
            project_id,
            kind: Some(ADD_RELEASE_TYPE),
            catcher_type: None,
            payload,
            timestamp: None,
        };
        self.enqueue(message).await?;

        metrics().releases_processed.inc();
        Ok(())
    }

    fn resolve_project(&self, token: &str) -> Result<String, Rejection> {
        if let Some(project_id) = self.tokens.resolve(token) {
            return Ok(project_id);
        }

        match &self.legacy {
            Some(decoder) => decoder.decode(token).map_err(|e| {
                debug!(error = %e, "Legacy token rejected");
                Rejection::LegacyToken(e.to_string())
            }),
            None => {
                debug!("Token is not in the resolver cache");
                Err(Rejection::InvalidToken)
            }
        }
    }

    fn check_blocked(&self, category: Category, project_id: &str) -> Result<(), Rejection> {
        if !self.blocked.contains(project_id) {
            return Ok(());
        }

        match category {
            Category::Performance => metrics().performance_blocked_by_limit.inc(),
            _ => metrics().errors_blocked_by_limit.inc(),
        }
        debug!(project_id = %project_id, category = category.as_str(), "Project is blocked");
        Err(Rejection::ProjectBlocked)
    }

    async fn consume_quota(&self, project_id: &str) -> Result<(), Rejection> {
        let limits = self.limits.limits_for(project_id).unwrap_or_else(|| {
            debug!(project_id = %project_id, "Project is not in the limits cache");
            RateLimitSettings::UNLIMITED
        });

        match self.quota.try_consume(project_id, limits).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Rejection::QuotaExceeded),
            Err(e) => {
                metrics().quota_store_errors.inc();
                error!(project_id = %project_id, error = %e, "Failed to update rate limit");
                Err(Rejection::QuotaUnavailable)
            }
        }
    }

    fn build_message(
        &self,
        submission: &CanonicalSubmission,
        project_id: String,
    ) -> Result<BrokerMessage, Rejection> {
        let now = Utc::now().timestamp();
        let route = self
            .config
            .routes
            .route_for(submission.category, &submission.catcher_type)
            .to_string();

        let message = match submission.category {
            Category::Performance => BrokerMessage {
                route,
                project_id,
                kind: None,
                catcher_type: Some(Category::Performance.as_str().to_string()),
                payload: stamp_timestamp(&submission.payload, now)?,
                timestamp: None,
            },
            Category::Errors | Category::Sentry | Category::Release => BrokerMessage {
                route,
                project_id,
                kind: None,
                catcher_type: Some(submission.catcher_type.clone()),
                payload: valid_json(&submission.payload)?,
                timestamp: Some(now),
            },
        };
        Ok(message)
    }

    async fn enqueue(&self, message: BrokerMessage) -> Result<(), Rejection> {
        debug!(route = %message.route, project_id = %message.project_id, "Enqueueing message");
        self.publisher.enqueue(message).await.map_err(|e| {
            error!(error = %e, "Publish pipeline unavailable");
            Rejection::PublishUnavailable
        })
    }
}

fn valid_json(payload: &[u8]) -> Result<Box<RawValue>, Rejection> {
    let text = std::str::from_utf8(payload).map_err(|_| Rejection::InvalidPayload)?;
    RawValue::from_string(text.to_string()).map_err(|_| Rejection::InvalidPayload)
}
