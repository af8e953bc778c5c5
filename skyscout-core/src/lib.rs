pub mod error;
pub mod provider;
pub mod repository;
pub mod resilience;
pub mod search;
pub mod validation;
pub mod wire;

pub use error::{translate, translate_poll, CallFailure, ErrorKind, TranslatedError};
pub use provider::SearchProvider;
pub use repository::{SessionStore, StoreError};
pub use resilience::{
    BreakerConfig, EndpointClass, RateLimitConfig, RateQuota, ResilienceConfig, RetryPolicy,
};
pub use search::{Market, QueryLeg, SearchQuery};
pub use validation::{validate, ValidationError};
