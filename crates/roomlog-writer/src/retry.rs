//! Bounded retry for transient store failures.

use crate::disposition::{disposition, Disposition};
use roomlog_config::Config;
use roomlog_store::StoreResult;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry limits for busy/locked errors.
///
/// Delay before retry `n` (1-based) is `base_delay * 2^(n - 1)`, capped at
/// `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let multiplier = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or runs
    /// out of attempts. `op` receives the 1-based attempt number.
    pub(crate) async fn run<T, F, Fut>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err)
                    if disposition(&err) == Disposition::Retry && attempt < self.max_attempts =>
                {
                    let delay = self.delay_for(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Store busy, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
