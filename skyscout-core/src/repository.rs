use async_trait::async_trait;
use skyscout_shared::{SearchSession, SessionToken};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Storage for sessions between create and the final poll.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_session(&self, session: &SearchSession) -> Result<(), StoreError>;

    async fn get_session(&self, token: &SessionToken) -> Result<Option<SearchSession>, StoreError>;
}
