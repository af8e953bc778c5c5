pub mod breaker;
pub mod executor;
pub mod orchestrator;
pub mod rate_limit;
pub mod sessions;
pub mod state;

#[cfg(test)]
mod testing;

pub use breaker::{Admission, CircuitBreaker, CircuitState};
pub use executor::{backoff_delay, ResilientExecutor};
pub use orchestrator::{SearchOrchestrator, SearchPhase};
pub use rate_limit::{RateDecision, RateLimiter};
pub use sessions::InMemorySessionStore;
pub use state::ResilienceState;
pub use tokio_util::sync::CancellationToken;
