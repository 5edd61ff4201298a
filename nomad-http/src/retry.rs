//! Retry policy and the retry loop.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::Result;

/// Default number of retries after the first attempt.
pub const DEFAULT_ATTEMPTS: u32 = 2;
/// Default delay before the first retry.
pub const DEFAULT_BASE: Duration = Duration::from_millis(50);
/// Default ceiling for a single backoff sleep.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(2);

/// Exponential backoff for server failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `2` means three attempts in total.
    pub attempts: u32,
    /// Delay before the first retry.
    pub base: Duration,
    /// Ceiling for any single delay.
    pub max_wait: Duration,
    /// Add up to 50% random jitter to each delay (still capped).
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base: DEFAULT_BASE,
            max_wait: DEFAULT_MAX_WAIT,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with no jitter.
    pub fn new(attempts: u32, base: Duration, max_wait: Duration) -> Self {
        Self {
            attempts,
            base,
            max_wait,
            jitter: false,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            attempts: 0,
            ..Default::default()
        }
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Deterministic delay before retry `retry` (0-indexed):
    /// `min(max_wait, base * 2^retry)`.
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max_wait)
    }

    /// The delay actually slept, with jitter applied when enabled.
    pub fn backoff(&self, retry: u32) -> Duration {
        let delay = self.delay_for_attempt(retry);
        if !self.jitter {
            return delay;
        }
        let extra = delay.mul_f64(rand::rng().random_range(0.0..=0.5));
        delay.saturating_add(extra).min(self.max_wait)
    }
}

/// Run `op` under `policy`, sleeping with `tokio::time::sleep` between
/// attempts.
pub async fn run<T, Op, Fut>(policy: &RetryPolicy, op: Op) -> Result<T>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    run_with(policy, tokio::time::sleep, op).await
}

/// Run `op` under `policy` with a caller-supplied sleeper.
///
/// `op` receives the 0-indexed attempt number. Only errors for which
/// [`Error::is_retryable`](crate::Error::is_retryable) holds are retried;
/// when retries run out the last error is returned unchanged.
pub async fn run_with<T, Op, Fut, Sleep, SleepFut>(
    policy: &RetryPolicy,
    mut sleep: Sleep,
    mut op: Op,
) -> Result<T>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut retry = 0;
    loop {
        match op(retry).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && retry < policy.attempts => {
                let delay = policy.backoff(retry);
                debug!(
                    attempt = retry + 1,
                    delay = ?delay,
                    error = ?e.status_code(),
                    "Retrying request after server error"
                );
                sleep(delay).await;
                retry += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(attempts = retry + 1, "Retries exhausted");
                }
                return Err(e);
            }
        }
    }
}
