use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use skyscout_core::{SessionStore, StoreError};
use skyscout_shared::pii::redact_token;
use skyscout_shared::{SearchSession, SessionState, SessionToken};
use std::collections::HashMap;
use tracing::debug;

const FIELD_STATE: &str = "state";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_UPDATED_AT: &str = "updated_at";

/// Sessions as Redis hashes under `search_session:{token}`. Every save
/// refreshes the TTL, so abandoned searches expire on their own.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(connection_string: &str, ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, ttl_seconds })
    }

    fn key(token: &SessionToken) -> String {
        format!("search_session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save_session(&self, session: &SearchSession) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::key(&session.session_token);

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(&key, &session_fields(session))
            .ignore()
            .expire(&key, self.ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(
            "Session {} saved as {}",
            redact_token(session.session_token.as_str()),
            session.state.as_str()
        );
        Ok(())
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Option<SearchSession>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(Self::key(token)).await?;

        // HGETALL on a missing (or expired) key is an empty hash
        if fields.is_empty() {
            return Ok(None);
        }
        session_from_fields(token, &fields).map(Some)
    }
}

fn session_fields(session: &SearchSession) -> [(&'static str, String); 3] {
    [
        (FIELD_STATE, session.state.as_str().to_string()),
        (FIELD_CREATED_AT, session.created_at.to_rfc3339()),
        (FIELD_UPDATED_AT, session.updated_at.to_rfc3339()),
    ]
}

fn session_from_fields(
    token: &SessionToken,
    fields: &HashMap<String, String>,
) -> Result<SearchSession, StoreError> {
    let field = |name: &str| -> Result<&String, StoreError> {
        fields
            .get(name)
            .ok_or_else(|| format!("session hash is missing '{}'", name).into())
    };
    let timestamp = |name: &str| -> Result<DateTime<Utc>, StoreError> {
        let raw = field(name)?;
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("bad '{}' timestamp '{}': {}", name, raw, e).into())
    };

    let raw_state = field(FIELD_STATE)?;
    let state = SessionState::parse(raw_state)
        .ok_or_else(|| -> StoreError { format!("unknown session state '{}'", raw_state).into() })?;

    Ok(SearchSession {
        session_token: token.clone(),
        state,
        created_at: timestamp(FIELD_CREATED_AT)?,
        updated_at: timestamp(FIELD_UPDATED_AT)?,
    })
}
