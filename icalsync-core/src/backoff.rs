//! Retrying remote calls that were rejected for rate limiting.
//!
//! Waits double from one second (1, 2, 4, ... seconds) with up to one second
//! of random jitter on top. Once the next wait would exceed the ceiling the
//! call fails for good.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::remote::RemoteError;

pub const DEFAULT_MAX_WAIT_SECS: u64 = 1025;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Largest wait, in seconds, that may still be slept before retrying.
    pub max_wait_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backoff {
    max_wait_secs: u64,
    jitter: fn() -> f64,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            max_wait_secs: config.max_wait_secs,
            jitter: rand::random::<f64>,
        }
    }

    /// Replace the jitter source. It must return values in `[0, 1)`.
    pub fn with_jitter(mut self, jitter: fn() -> f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait, in whole seconds, before the next retry.
    pub fn next_wait(previous: Option<u64>) -> u64 {
        previous.map_or(1, |wait| wait.saturating_mul(2))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the wait ceiling is reached.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt: u32 = 0;
        let mut wait: Option<u64> = None;

        loop {
            attempt += 1;

            let payload = match operation().await {
                Err(RemoteError::RateLimited(payload)) => payload,
                other => return other,
            };

            let next = Self::next_wait(wait);
            if next > self.max_wait_secs {
                warn!(label, attempt, "giving up after repeated rate limiting");
                return Err(RemoteError::RequestFailed(format!(
                    "{label}: still rate limited after {attempt} attempts: {payload}"
                )));
            }

            let delay = next as f64 + (self.jitter)();
            warn!(label, attempt, delay_secs = delay, "rate limited, retrying");
            debug!(label, %payload, "rate limit payload");

            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            wait = Some(next);
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
