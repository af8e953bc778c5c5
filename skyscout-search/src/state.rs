use skyscout_core::{EndpointClass, ResilienceConfig, RetryPolicy};

use crate::breaker::CircuitBreaker;
use crate::rate_limit::RateLimiter;

/// Process-wide breaker and rate-limit state, one breaker per endpoint class.
///
/// Built once at startup and handed to the orchestrator; tests build their
/// own so nothing leaks between them.
pub struct ResilienceState {
    retry: RetryPolicy,
    create_breaker: CircuitBreaker,
    poll_breaker: CircuitBreaker,
    other_breaker: CircuitBreaker,
    limiter: RateLimiter,
}

impl ResilienceState {
    pub fn new(config: &ResilienceConfig) -> Self {
        Self {
            retry: config.retry.clone(),
            create_breaker: CircuitBreaker::new(EndpointClass::Create.as_str(), &config.breaker),
            poll_breaker: CircuitBreaker::new(EndpointClass::Poll.as_str(), &config.breaker),
            other_breaker: CircuitBreaker::new(EndpointClass::Other.as_str(), &config.breaker),
            limiter: RateLimiter::new(config.rate_limits.clone()),
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn breaker(&self, class: EndpointClass) -> &CircuitBreaker {
        match class {
            EndpointClass::Create => &self.create_breaker,
            EndpointClass::Poll => &self.poll_breaker,
            EndpointClass::Other => &self.other_breaker,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

impl Default for ResilienceState {
    fn default() -> Self {
        Self::new(&ResilienceConfig::default())
    }
}
