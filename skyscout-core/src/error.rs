use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::resilience::EndpointClass;
use crate::validation::ValidationError;

/// Client-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidQuery,
    LocalRateLimited,
    RateLimited,
    InvalidUpstreamRequest,
    AuthenticationFailed,
    Forbidden,
    NotFound,
    SessionNotFound,
    ProviderError,
    ProviderUnreachable,
    ProviderUnavailable,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidQuery => "INVALID_QUERY",
            ErrorKind::LocalRateLimited => "LOCAL_RATE_LIMITED",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::InvalidUpstreamRequest => "INVALID_UPSTREAM_REQUEST",
            ErrorKind::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorKind::ProviderError => "PROVIDER_ERROR",
            ErrorKind::ProviderUnreachable => "PROVIDER_UNREACHABLE",
            ErrorKind::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Whether a client may retry the same request later without changing it.
    /// 4xx-class outcomes need new user input instead.
    pub fn is_client_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::LocalRateLimited
                | ErrorKind::RateLimited
                | ErrorKind::ProviderError
                | ErrorKind::ProviderUnreachable
                | ErrorKind::ProviderUnavailable
                | ErrorKind::Cancelled
                | ErrorKind::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single failed provider call (or of a call that was never made).
/// The executor matches on the variant to decide retry and breaker accounting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider request timed out")]
    Timeout,

    #[error("provider responded with {status}: {message}")]
    Http { status: u16, message: String },

    #[error("unexpected provider response: {0}")]
    Decode(String),

    #[error("circuit breaker for the {0} endpoint is open")]
    CircuitOpen(EndpointClass),

    #[error("provider call cancelled")]
    Cancelled,
}

impl CallFailure {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        CallFailure::Http {
            status,
            message: message.into(),
        }
    }

    /// Transport errors, timeouts and 429/500/502/503 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            CallFailure::Transport(_) | CallFailure::Timeout => true,
            CallFailure::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503),
            _ => false,
        }
    }

    /// Only failures that say something about provider health feed the breaker.
    /// Client errors, cancellations and undecodable bodies never do.
    pub fn counts_toward_breaker(&self) -> bool {
        match self {
            CallFailure::Transport(_) | CallFailure::Timeout => true,
            CallFailure::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A terminal failure ready to be shown to a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TranslatedError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
    pub details: Vec<String>,
    pub retry_after: Option<Duration>,
}

impl TranslatedError {
    pub fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            details: Vec::new(),
            retry_after: None,
        }
    }

    pub fn invalid_query(errors: &[ValidationError]) -> Self {
        Self {
            details: errors.iter().map(ToString::to_string).collect(),
            ..Self::new(ErrorKind::InvalidQuery, 400, "Validation failed")
        }
    }

    pub fn local_rate_limited(class: EndpointClass, retry_after: Duration) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(
                ErrorKind::LocalRateLimited,
                429,
                format!("Too many {} requests, retry later", class),
            )
        }
    }

    pub fn session_not_found(token: &str) -> Self {
        Self::new(
            ErrorKind::SessionNotFound,
            404,
            format!("Search session '{}' not found", token),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, 500, message)
    }
}

/// Maps any call failure onto the taxonomy. Pure, no I/O.
pub fn translate(failure: &CallFailure) -> TranslatedError {
    match failure {
        CallFailure::CircuitOpen(class) => TranslatedError::new(
            ErrorKind::ProviderUnavailable,
            503,
            format!("Flight search provider is unavailable ({} circuit open)", class),
        ),
        CallFailure::Transport(reason) => TranslatedError::new(
            ErrorKind::ProviderUnreachable,
            502,
            format!("Could not reach flight search provider: {}", reason),
        ),
        CallFailure::Timeout => TranslatedError::new(
            ErrorKind::ProviderUnreachable,
            503,
            "Flight search provider timed out",
        ),
        CallFailure::Cancelled => {
            TranslatedError::new(ErrorKind::Cancelled, 499, "Request was cancelled")
        }
        CallFailure::Decode(reason) => TranslatedError::new(
            ErrorKind::ProviderError,
            500,
            format!("Unexpected response from flight search provider: {}", reason),
        ),
        CallFailure::Http { status, message } => translate_status(*status, message),
    }
}

/// Same as [`translate`], except a provider 404 on poll means the session
/// (or the route it searched) cannot be resolved.
pub fn translate_poll(failure: &CallFailure, token: &str) -> TranslatedError {
    let translated = translate(failure);
    if translated.kind == ErrorKind::NotFound {
        TranslatedError::session_not_found(token)
    } else {
        translated
    }
}

fn translate_status(status: u16, provider_message: &str) -> TranslatedError {
    let (kind, hint, fallback) = match status {
        400 => (
            ErrorKind::InvalidUpstreamRequest,
            400,
            "Flight search provider rejected the request",
        ),
        401 => (
            ErrorKind::AuthenticationFailed,
            401,
            "Flight search provider rejected the API key",
        ),
        403 => (ErrorKind::Forbidden, 403, "Access to the flight search provider is forbidden"),
        404 => (ErrorKind::NotFound, 404, "Flight search provider resource not found"),
        429 => (ErrorKind::RateLimited, 429, "Flight search provider rate limit exceeded"),
        _ => (ErrorKind::ProviderError, 500, "Flight search provider error"),
    };

    let message = if provider_message.trim().is_empty() {
        format!("{} (status {})", fallback, status)
    } else {
        format!("{} (status {}): {}", fallback, status, provider_message)
    };
    TranslatedError::new(kind, hint, message)
}
