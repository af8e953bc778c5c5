use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Logical grouping of provider endpoints. Rate limits and breaker state are
/// scoped per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
    Create,
    Poll,
    Other,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Create => "create",
            EndpointClass::Poll => "poll",
            EndpointClass::Other => "other",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResilienceConfig {
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_wait_ms")]
    pub base_wait_ms: u64,
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_base_wait_ms() -> u64 { 10_000 }
fn default_max_jitter_ms() -> u64 { 5_000 }

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_wait_ms: default_base_wait_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    /// Deterministic part of the wait before retry number `attempt` (1-based):
    /// `base_wait * 2^(attempt-1)`.
    pub fn backoff_floor(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.base_wait_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Failures older than this no longer count toward the threshold.
    #[serde(default = "default_failure_window_secs")]
    pub failure_window_secs: u64,
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

fn default_failure_threshold() -> u32 { 5 }
fn default_failure_window_secs() -> u64 { 60 }
fn default_reset_timeout_secs() -> u64 { 30 }

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            failure_window_secs: default_failure_window_secs(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

impl BreakerConfig {
    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuota {
    pub quota: u32,
    pub window_secs: u64,
}

impl RateQuota {
    pub fn new(quota: u32, window_secs: u64) -> Self {
        Self { quota, window_secs }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_create_quota")]
    pub create: RateQuota,
    #[serde(default = "default_poll_quota")]
    pub poll: RateQuota,
    #[serde(default = "default_other_quota")]
    pub other: RateQuota,
}

fn default_create_quota() -> RateQuota { RateQuota::new(100, 60) }
fn default_poll_quota() -> RateQuota { RateQuota::new(500, 60) }
fn default_other_quota() -> RateQuota { RateQuota::new(500, 60) }

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            create: default_create_quota(),
            poll: default_poll_quota(),
            other: default_other_quota(),
        }
    }
}

impl RateLimitConfig {
    pub fn quota_for(&self, class: EndpointClass) -> RateQuota {
        match class {
            EndpointClass::Create => self.create,
            EndpointClass::Poll => self.poll,
            EndpointClass::Other => self.other,
        }
    }
}
