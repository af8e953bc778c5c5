use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use skyscout_core::{ErrorKind, SearchQuery, TranslatedError};
use skyscout_search::CancellationToken;
use skyscout_shared::{PollResult, SessionToken};
use tracing::Instrument;

use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSearchResponse {
    pub session_token: SessionToken,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights/search/create", post(create_search))
        .route("/api/flights/search/poll/{token}", get(poll_search))
}

// ============================================================================
// Handlers
// ============================================================================
//
// The search runs on its own task. If the client goes away the handler future
// is dropped, the guard cancels the token and the task winds down through the
// executor's cancellation path, which frees any half-open breaker trial.
// Spawned tasks do not inherit the request span, so it is re-attached here.

/// POST /api/flights/search/create
pub async fn create_search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSearchResponse>), ApiError> {
    let Json(query) = payload.map_err(|rejection| {
        TranslatedError::new(ErrorKind::InvalidQuery, 400, rejection.body_text())
    })?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let orchestrator = state.orchestrator.clone();
    let span = tracing::info_span!("search", request_id = %request_id.as_str());
    let session_token = tokio::spawn(
        async move { orchestrator.create_with_cancel(&query, &cancel).await }.instrument(span),
    )
    .await??;

    Ok((StatusCode::CREATED, Json(CreateSearchResponse { session_token })))
}

/// GET /api/flights/search/poll/{token}
pub async fn poll_search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(token): Path<String>,
) -> Result<Json<PollResult>, ApiError> {
    let token = SessionToken::new(token);

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let orchestrator = state.orchestrator.clone();
    let span = tracing::info_span!("search", request_id = %request_id.as_str());
    let result = tokio::spawn(
        async move { orchestrator.poll_with_cancel(&token, &cancel).await }.instrument(span),
    )
    .await??;

    Ok(Json(result))
}
