use skyscout_core::BreakerConfig;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failure detected, failing fast
    HalfOpen, // Testing if service is back
}

/// Answer to "may I call the provider now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The single trial call allowed while half-open.
    Trial,
    Rejected,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    window_started: Option<Instant>,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

pub struct CircuitBreaker {
    pub name: String,
    failure_threshold: u32,
    failure_window: Duration,
    reset_timeout: Duration,
    inner: RwLock<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: &str, config: &BreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            failure_threshold: config.failure_threshold.max(1),
            failure_window: config.failure_window(),
            reset_timeout: config.reset_timeout(),
            inner: RwLock::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                window_started: None,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.read().await.state
    }

    pub async fn failure_count(&self) -> u32 {
        self.inner.read().await.failure_count
    }

    pub async fn check(&self) -> Admission {
        let mut inner = self.inner.write().await;
        match inner.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_some_and(|opened| opened.elapsed() >= self.reset_timeout);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
            // Half-Open allows one request through
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    Admission::Rejected
                } else {
                    inner.trial_in_flight = true;
                    Admission::Trial
                }
            }
        }
    }

    /// Outcomes are reported with the admission the call was given. Only the
    /// half-open trial (`Admission::Trial`) may resolve a half-open circuit;
    /// calls admitted while closed that finish after a trip are ignored.
    pub async fn record_success(&self, admission: Admission) {
        let mut inner = self.inner.write().await;
        match (inner.state, admission) {
            (CircuitState::HalfOpen, Admission::Trial) => {
                tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
                Self::close(&mut inner);
            }
            (CircuitState::Closed, _) => Self::close(&mut inner),
            _ => {}
        }
    }

    pub async fn record_failure(&self, admission: Admission) {
        let now = Instant::now();
        let mut inner = self.inner.write().await;

        match (inner.state, admission) {
            (CircuitState::HalfOpen, Admission::Trial) => self.trip(&mut inner, now),
            (CircuitState::Closed, _) => {
                let window_expired = inner
                    .window_started
                    .map_or(true, |started| now.duration_since(started) > self.failure_window);
                if window_expired {
                    inner.window_started = Some(now);
                    inner.failure_count = 0;
                }

                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    self.trip(&mut inner, now);
                }
            }
            // A call admitted before the trip finished late
            _ => {}
        }
    }

    /// The provider answered but the answer does not reflect its health (a 4xx).
    /// Counts for nothing while closed; resolves the half-open trial as healthy.
    pub async fn record_neutral(&self, admission: Admission) {
        let mut inner = self.inner.write().await;
        if inner.state == CircuitState::HalfOpen && admission == Admission::Trial {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
            Self::close(&mut inner);
        }
    }

    /// Gives back the half-open trial slot after the trial call was abandoned.
    /// Only the holder of `Admission::Trial` may call this.
    pub async fn release_trial(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }

    fn trip(&self, inner: &mut BreakerInner, now: Instant) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.trial_in_flight = false;
        tracing::error!(
            "Circuit Breaker [{}] TRIPPED to Open. Failures: {}",
            self.name,
            inner.failure_count
        );
    }

    fn close(inner: &mut BreakerInner) {
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.window_started = None;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }
}
