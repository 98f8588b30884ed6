//! Retry policy for upstream calls.
//!
//! Expressed as an explicit policy object passed to each call site rather
//! than implicit wrapping: the caller supplies the operation and a predicate
//! deciding which errors are retryable.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::RequestConfig;

/// Retry policy: attempt count, exponential backoff, and the retryable-error
/// predicate supplied at the call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: u32) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
        }
    }

    /// Policy for work-tracker calls, taken from request configuration.
    pub fn from_config(config: &RequestConfig) -> Self {
        Self::new(
            config.max_retries.max(1),
            Duration::from_millis(config.retry_delay_ms),
            2,
        )
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, 2)
    }

    /// Delay before the given retry (1-based retry index).
    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * self.backoff_factor.pow(retry.saturating_sub(1))
    }

    /// Run `op`, retrying while `retryable` holds and attempts remain.
    pub async fn run<T, E, F, Fut, P>(&self, op_name: &str, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && retryable(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        op = %op_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upstream call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
