//! Fixed-interval retry with an injectable sleeper.
//!
//! Used for startup dependency checks: a bounded number of attempts separated
//! by a constant pause. The pause never grows between attempts.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }
}

/// Source of delays between attempts. Tests swap in a recording sleeper so no
/// wall-clock time passes.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `f` until it succeeds or `policy.max_attempts` is reached.
///
/// Sleeps `policy.interval` between attempts, never after the last one. The
/// error is logged through its `Display` impl, so callers should hand in
/// errors that are safe to log.
pub async fn retry_fixed<F, Fut, T, E>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    operation_name: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Operation failed, no attempts left"
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %e,
                    interval_ms = policy.interval.as_millis() as u64,
                    "Operation failed, retrying"
                );
                sleeper.sleep(policy.interval).await;
                attempt += 1;
            }
        }
    }
}
