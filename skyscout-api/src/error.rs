use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skyscout_core::{ErrorKind, TranslatedError};

/// A translated failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TranslatedError);

impl From<TranslatedError> for ApiError {
    fn from(err: TranslatedError) -> Self {
        Self(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Search task failed: {}", err);
        Self(TranslatedError::internal("Internal Server Error"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the logs
        let message = if err.kind == ErrorKind::Internal {
            "Internal Server Error".to_string()
        } else {
            err.message
        };

        let body = Json(json!({
            "error": err.kind,
            "message": message,
            "details": err.details,
        }));

        let mut response = (status, body).into_response();
        if let Some(retry_after) = err.retry_after {
            // Whole seconds, rounded up so a client never retries early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyscout_core::EndpointClass;
    use std::time::Duration;

    #[test]
    fn test_retry_after_rounds_up() {
        let retry_after = Duration::from_millis(1_200);
        let err = TranslatedError::local_rate_limited(EndpointClass::Create, retry_after);
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn test_cancelled_uses_client_closed_status() {
        let err = TranslatedError::new(ErrorKind::Cancelled, 499, "Request was cancelled");
        let response = ApiError(err).into_response();
        assert_eq!(response.status().as_u16(), 499);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
