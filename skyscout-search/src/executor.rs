//! Retry with exponential backoff and jitter, guarded by the per-endpoint
//! circuit breaker.
//!
//! Retries on:
//! - transport errors and timeouts
//! - 429, 500, 502, 503
//!
//! Does not retry on:
//! - other 4xx (never counted by the breaker either)
//! - other 5xx (counted by the breaker)
//! - an open circuit (no attempt is made)
//! - cancellation (not counted by the breaker)

use rand::Rng;
use skyscout_core::{CallFailure, EndpointClass, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::breaker::Admission;
use crate::state::ResilienceState;

pub struct ResilientExecutor {
    state: Arc<ResilienceState>,
}

impl ResilientExecutor {
    pub fn new(state: Arc<ResilienceState>) -> Self {
        Self { state }
    }

    /// Run `op` (one network attempt per invocation) until it succeeds, fails
    /// terminally, or the retry budget runs out.
    pub async fn execute<T, F, Fut>(
        &self,
        class: EndpointClass,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, CallFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallFailure>>,
    {
        let policy = self.state.retry_policy();
        let breaker = self.state.breaker(class);
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let admission = breaker.check().await;
            if admission == Admission::Rejected {
                warn!(endpoint = %class, "Circuit open, provider call skipped");
                return Err(CallFailure::CircuitOpen(class));
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CallFailure::Cancelled),
                result = op() => result,
            };

            let failure = match outcome {
                Ok(value) => {
                    breaker.record_success(admission).await;
                    debug!(endpoint = %class, attempt, "Provider call succeeded");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if failure == CallFailure::Cancelled {
                if admission == Admission::Trial {
                    breaker.release_trial().await;
                }
                return Err(failure);
            }

            if !failure.counts_toward_breaker() {
                breaker.record_neutral(admission).await;
                return Err(failure);
            }

            breaker.record_failure(admission).await;

            if !failure.is_retryable() || attempt >= max_attempts {
                warn!(
                    endpoint = %class,
                    attempt,
                    error = %failure,
                    "Provider call failed, giving up"
                );
                return Err(failure);
            }

            let delay = backoff_delay(policy, attempt);
            warn!(
                endpoint = %class,
                "{} on attempt {}/{}, retrying after {:?}",
                failure,
                attempt,
                max_attempts,
                delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CallFailure::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Wait before retry number `attempt` (1-based):
/// `base_wait * 2^(attempt-1) + uniform(0, max_jitter)`.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let jitter_ms = if policy.max_jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=policy.max_jitter_ms)
    };
    policy
        .backoff_floor(attempt)
        .saturating_add(Duration::from_millis(jitter_ms))
}
