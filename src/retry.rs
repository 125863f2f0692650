//! Bounded retry with quadratic backoff.
//!
//! Retry here is an explicit combinator applied at each call site rather
//! than a wrapper baked into the operations themselves, so each retry scope
//! (issuing the connect command, polling for the new device node) carries
//! its own visible budget and can be tested on its own.

use std::time::Duration;

use tracing::debug;

use crate::error::NvmeError;

/// Budget for one retry scope: how many attempts, and how long to back off
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, counted from 1.  Never zero in practice; a value of 1
    /// means "no retries".
    pub max_attempts: u32,
    /// Base unit of the backoff schedule.
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt`: `attempt² × unit`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt.saturating_mul(attempt)
    }
}

/// Invoke `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget runs out, sleeping `policy.backoff(attempt)`
/// between attempts.  The last error is surfaced on exhaustion, unmodified.
///
/// `is_retryable` decides which error kinds are worth another attempt;
/// anything else returns immediately.
pub async fn retry<T, F, Fut, P>(
    policy: RetryPolicy,
    is_retryable: P,
    mut op: F,
) -> Result<T, NvmeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NvmeError>>,
    P: Fn(&NvmeError) -> bool,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_retryable(&e) => {
                let delay = policy.backoff(attempt);
                debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retryable failure, backing off",
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
