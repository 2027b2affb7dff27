//! Deadline-bounded retry for upstream calls.

use learnforge_core::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Retry configuration for upstream generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds, fails non-retryably, runs out of attempts,
    /// or the deadline passes.
    ///
    /// Each attempt is abandoned at `deadline` and counts as a timeout. No
    /// retry is scheduled if its pause would end past the deadline.
    pub async fn run<T, F, Fut>(&self, deadline: Instant, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout_at(deadline, op(attempt)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Timeout),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= max_attempts {
                return Err(err);
            }

            let resume_at = Instant::now().checked_add(self.delay);
            if resume_at.map_or(true, |at| at >= deadline) {
                tracing::debug!(attempt, error = %err, "Deadline too close to retry");
                return Err(err);
            }

            tracing::warn!(
                attempt,
                delay_ms = self.delay.as_millis() as u64,
                error = %err,
                "Retryable upstream failure, retrying"
            );
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}
