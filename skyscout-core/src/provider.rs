use async_trait::async_trait;
use skyscout_shared::SessionToken;

use crate::error::CallFailure;
use crate::search::SearchQuery;
use crate::wire::{CreateResponse, PollResponse};

/// The narrow network contract of the flight-search provider. Each method is
/// exactly one attempt; retries and breaker accounting happen around it.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Submit a validated query to the create endpoint
    async fn create(&self, query: &SearchQuery) -> Result<CreateResponse, CallFailure>;

    /// Fetch the current state of a search from the poll endpoint
    async fn poll(&self, token: &SessionToken) -> Result<PollResponse, CallFailure>;
}
