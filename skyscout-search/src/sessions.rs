use async_trait::async_trait;
use skyscout_core::{SessionStore, StoreError};
use skyscout_shared::{SearchSession, SessionToken};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_TTL: Duration = Duration::from_secs(3_600);

struct StoredSession {
    session: SearchSession,
    expires_at: Instant,
}

/// Default session store. Like the Redis store, every save refreshes the
/// entry's TTL; expired entries read as absent and are pruned on the next save.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, StoredSession>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Live (unexpired) sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|stored| stored.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_session(&self, session: &SearchSession) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        if sessions.len() < before {
            debug!("Evicted {} expired search sessions", before - sessions.len());
        }

        sessions.insert(
            session.session_token.clone(),
            StoredSession {
                session: session.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn get_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<SearchSession>, StoreError> {
        let now = Instant::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(token)
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.session.clone()))
    }
}
