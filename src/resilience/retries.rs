//! Retry logic for idempotent node reads.
//!
//! # Design Decisions
//! - Never used for transaction submission (non-idempotent)
//! - Retries only errors classified transient by `NodeError::is_transient`
//! - Jittered backoff between attempts

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::config::NodeConfig;
use crate::node::types::NodeResult;

/// How many times to attempt a read and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&NodeConfig> for RetryPolicy {
    fn from(config: &NodeConfig) -> Self {
        Self {
            max_attempts: config.max_read_attempts.max(1),
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at the maximum, plus up to 10% jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let capped = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(retry - 1))
            .min(self.max_delay_ms);
        let jitter = match capped / 10 {
            0 => 0,
            range => rand::thread_rng().gen_range(0..range),
        };
        Duration::from_millis(capped + jitter)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub async fn retry_idempotent<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> NodeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = NodeResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < policy.max_attempts => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying node read");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
