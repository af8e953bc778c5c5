use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, provider-issued identifier correlating polls with a create call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Pending,
    Complete,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Pending => "pending",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SessionState::Pending),
            "complete" => Some(SessionState::Complete),
            "failed" => Some(SessionState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Pending)
    }
}

/// A search the provider accepted. The token never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSession {
    pub session_token: SessionToken,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SearchSession {
    pub fn new(session_token: SessionToken) -> Self {
        let now = Utc::now();
        Self {
            session_token,
            state: SessionState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending → Complete
    pub fn mark_complete(&mut self) {
        self.update_state(SessionState::Complete);
    }

    /// Pending → Failed
    pub fn mark_failed(&mut self) {
        self.update_state(SessionState::Failed);
    }

    fn update_state(&mut self, state: SessionState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}
