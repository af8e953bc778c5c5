//! Local admission control per endpoint class.
//!
//! Fixed-window counters: each class gets `quota` calls per `window`, and the
//! counter starts over at the first call after the window has elapsed. A denial
//! is final for the caller; it never enters the executor's retry loop.

use skyscout_core::{EndpointClass, RateLimitConfig, RateQuota};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<EndpointClass, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn quota(&self, class: EndpointClass) -> RateQuota {
        self.config.quota_for(class)
    }

    pub async fn try_acquire(&self, class: EndpointClass) -> RateDecision {
        let quota = self.quota(class);
        let window_len = quota.window();
        let now = Instant::now();

        let mut windows = self.windows.lock().await;
        let window = windows.entry(class).or_insert(Window { started: now, count: 0 });

        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        if window.count < quota.quota {
            window.count += 1;
            RateDecision::Allowed
        } else {
            let retry_after = window_len.saturating_sub(now.duration_since(window.started));
            tracing::warn!(
                endpoint = %class,
                quota = quota.quota,
                ?retry_after,
                "Local rate limit exceeded"
            );
            RateDecision::Denied { retry_after }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(create: u32, poll: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            create: RateQuota::new(create, 60),
            poll: RateQuota::new(poll, 60),
            other: RateQuota::new(1, 60),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_denies_after_quota() {
        let limiter = limiter(2, 10);
        assert_eq!(limiter.try_acquire(EndpointClass::Create).await, RateDecision::Allowed);
        assert_eq!(limiter.try_acquire(EndpointClass::Create).await, RateDecision::Allowed);

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(
            limiter.try_acquire(EndpointClass::Create).await,
            RateDecision::Denied { retry_after: Duration::from_secs(40) }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = limiter(1, 10);
        assert_eq!(limiter.try_acquire(EndpointClass::Create).await, RateDecision::Allowed);
        assert!(matches!(
            limiter.try_acquire(EndpointClass::Create).await,
            RateDecision::Denied { .. }
        ));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.try_acquire(EndpointClass::Create).await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn test_classes_are_independent() {
        let limiter = limiter(1, 1);
        assert_eq!(limiter.try_acquire(EndpointClass::Create).await, RateDecision::Allowed);
        assert_eq!(limiter.try_acquire(EndpointClass::Poll).await, RateDecision::Allowed);
        assert_eq!(limiter.try_acquire(EndpointClass::Other).await, RateDecision::Allowed);
        assert!(matches!(
            limiter.try_acquire(EndpointClass::Poll).await,
            RateDecision::Denied { .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_quota_always_denies() {
        let limiter = limiter(0, 1);
        assert!(matches!(
            limiter.try_acquire(EndpointClass::Create).await,
            RateDecision::Denied { .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_never_exceed_quota() {
        let limiter = Arc::new(limiter(10, 10));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.try_acquire(EndpointClass::Create).await
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() == RateDecision::Allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }
}
