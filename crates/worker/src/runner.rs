//! Periodic Task Runner and startup warm-up.

use backoff::future::retry_notify;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use gateway_core::limits::{
    WARMUP_INITIAL_BACKOFF_SECS, WARMUP_MAX_BACKOFF_SECS, WARMUP_MAX_ELAPSED_SECS,
};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Run `task` once per `period` until `cancel` fires.
///
/// The first run happens one full period after the call. Failures are
/// logged and the next tick tries again. A cycle in flight when `cancel`
/// fires is allowed to finish.
pub async fn run_periodically<F, Fut, T, E>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut task: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(task = name, period_secs = period.as_secs_f64(), "Periodic task started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = task().await {
                    error!(task = name, error = %e, "Periodic task failed");
                }
            }
        }
    }

    info!(task = name, "Periodic task stopped");
}

/// Backoff for loading state the gateway cannot serve without.
///
/// 1s initial interval doubling up to 30s, giving up after 3 minutes.
pub fn warm_up_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_secs(WARMUP_INITIAL_BACKOFF_SECS))
        .with_multiplier(2.0)
        .with_max_interval(Duration::from_secs(WARMUP_MAX_BACKOFF_SECS))
        .with_max_elapsed_time(Some(Duration::from_secs(WARMUP_MAX_ELAPSED_SECS)))
        .build()
}

/// Retry `op` under `policy` until it succeeds or the time budget runs out.
///
/// Every failure is treated as transient; the last error is returned once
/// the backoff's elapsed-time budget is spent.
pub async fn warm_up<F, Fut, T, E>(
    name: &'static str,
    policy: ExponentialBackoff,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let result = retry_notify(
        policy,
        || {
            let attempt = op();
            async move { attempt.await.map_err(backoff::Error::transient) }
        },
        |e: E, retry_in: Duration| {
            warn!(
                task = name,
                retry_in_ms = retry_in.as_millis() as u64,
                error = %e,
                "Warm-up step failed, retrying"
            );
        },
    )
    .await;

    match &result {
        Ok(_) => debug!(task = name, "Warm-up step succeeded"),
        Err(e) => error!(task = name, error = %e, "Warm-up step gave up"),
    }
    result
}
