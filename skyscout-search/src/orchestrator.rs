use skyscout_core::wire::CreateResponse;
use skyscout_core::{
    translate, translate_poll, validate, CallFailure, EndpointClass, ErrorKind, SearchProvider,
    SearchQuery, SessionStore, StoreError, TranslatedError,
};
use skyscout_shared::pii::redact_token;
use skyscout_shared::{PollResult, SearchSession, SessionToken};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::executor::ResilientExecutor;
use crate::rate_limit::RateDecision;
use crate::state::ResilienceState;

/// Where a search request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Validating,
    RateChecking,
    Submitting,
    Pending,
    Polling,
    Complete,
    Failed,
}

/// Drives the create → poll protocol against the provider.
///
/// Every call is one round-trip: `poll` never loops or sleeps waiting for
/// completion, pacing belongs to the caller.
pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
    sessions: Arc<dyn SessionStore>,
    resilience: Arc<ResilienceState>,
    executor: ResilientExecutor,
}

impl SearchOrchestrator {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        sessions: Arc<dyn SessionStore>,
        resilience: Arc<ResilienceState>,
    ) -> Self {
        Self {
            provider,
            sessions,
            executor: ResilientExecutor::new(resilience.clone()),
            resilience,
        }
    }

    pub fn resilience(&self) -> &Arc<ResilienceState> {
        &self.resilience
    }

    pub async fn create(&self, query: &SearchQuery) -> Result<SessionToken, TranslatedError> {
        self.create_with_cancel(query, &CancellationToken::new()).await
    }

    /// Validate → rate-check → submit. On success the session is stored as
    /// pending and its token returned.
    pub async fn create_with_cancel(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<SessionToken, TranslatedError> {
        let span = tracing::info_span!("search_create");
        async move {
            debug!(phase = ?SearchPhase::Validating);
            let errors = validate(query);
            if !errors.is_empty() {
                return Err(failed(TranslatedError::invalid_query(&errors)));
            }

            debug!(phase = ?SearchPhase::RateChecking);
            if let RateDecision::Denied { retry_after } =
                self.resilience.limiter().try_acquire(EndpointClass::Create).await
            {
                return Err(failed(TranslatedError::local_rate_limited(
                    EndpointClass::Create,
                    retry_after,
                )));
            }

            debug!(phase = ?SearchPhase::Submitting);
            let response = self
                .executor
                .execute(EndpointClass::Create, cancel, || self.provider.create(query))
                .await
                .and_then(require_token)
                .map_err(|failure| failed(translate(&failure)))?;

            let session = SearchSession::new(SessionToken::new(response.session_token));
            self.sessions
                .save_session(&session)
                .await
                .map_err(|e| failed(store_failure("store", e)))?;

            info!(
                phase = ?SearchPhase::Pending,
                session = %redact_token(session.session_token.as_str()),
                "Flight search initiated"
            );
            Ok(session.session_token)
        }
        .instrument(span)
        .await
    }

    pub async fn poll(&self, token: &SessionToken) -> Result<PollResult, TranslatedError> {
        self.poll_with_cancel(token, &CancellationToken::new()).await
    }

    /// One poll round-trip. Incomplete results are returned as they are;
    /// a complete result moves the session to `complete`.
    pub async fn poll_with_cancel(
        &self,
        token: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<PollResult, TranslatedError> {
        let span = tracing::info_span!("search_poll", session = %redact_token(token.as_str()));
        async move {
            debug!(phase = ?SearchPhase::RateChecking);
            if let RateDecision::Denied { retry_after } =
                self.resilience.limiter().try_acquire(EndpointClass::Poll).await
            {
                return Err(TranslatedError::local_rate_limited(EndpointClass::Poll, retry_after));
            }

            let mut session = self
                .sessions
                .get_session(token)
                .await
                .map_err(|e| store_failure("load", e))?
                .ok_or_else(|| {
                    warn!("Poll for unknown session");
                    TranslatedError::session_not_found(token.as_str())
                })?;

            debug!(phase = ?SearchPhase::Polling);
            let response = match self
                .executor
                .execute(EndpointClass::Poll, cancel, || self.provider.poll(token))
                .await
            {
                Ok(response) => response,
                Err(failure) => {
                    let translated = translate_poll(&failure, token.as_str());
                    // A finished session keeps its outcome.
                    if translated.kind == ErrorKind::SessionNotFound
                        && !session.state.is_terminal()
                    {
                        session.mark_failed();
                        if let Err(e) = self.sessions.save_session(&session).await {
                            warn!("Failed to record failed session: {}", e);
                        }
                    }
                    return Err(failed(translated));
                }
            };

            let result = PollResult::from(response);
            if result.is_complete() && !session.state.is_terminal() {
                session.mark_complete();
                self.sessions
                    .save_session(&session)
                    .await
                    .map_err(|e| store_failure("store", e))?;
                info!(
                    phase = ?SearchPhase::Complete,
                    flights = result.flights.len(),
                    "Flight search complete"
                );
            } else {
                debug!(phase = ?SearchPhase::Pending, "Flight search still in progress");
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }

    pub async fn session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<SearchSession>, TranslatedError> {
        self.sessions
            .get_session(token)
            .await
            .map_err(|e| store_failure("load", e))
    }
}

fn require_token(response: CreateResponse) -> Result<CreateResponse, CallFailure> {
    if response.session_token.trim().is_empty() {
        Err(CallFailure::Decode(
            "create response carried an empty sessionToken".to_string(),
        ))
    } else {
        Ok(response)
    }
}

fn store_failure(action: &str, err: StoreError) -> TranslatedError {
    TranslatedError::internal(format!("Failed to {} search session: {}", action, err))
}

fn failed(err: TranslatedError) -> TranslatedError {
    if err.status >= 500 {
        error!(phase = ?SearchPhase::Failed, kind = %err.kind, "{}", err.message);
    } else {
        warn!(phase = ?SearchPhase::Failed, kind = %err.kind, "{}", err.message);
    }
    err
}
