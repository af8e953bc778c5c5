use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use skyscout_core::wire::{CreateResponse, PollResponse};
use skyscout_core::{CallFailure, SearchProvider, SearchQuery};
use skyscout_shared::pii::redact_token;
use skyscout_shared::{Masked, SessionToken};
use tracing::debug;

use crate::app_config::ProviderConfig;

const API_KEY_HEADER: &str = "x-api-key";
const JSON: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ProviderClientError {
    #[error("invalid provider base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("provider api key is empty")]
    MissingApiKey,
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Live provider over HTTPS. One method call is one request; nothing here
/// retries.
#[derive(Clone)]
pub struct HttpSearchProvider {
    client: Client,
    base_url: Url,
    api_key: Masked<String>,
}

impl HttpSearchProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderClientError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProviderClientError::InvalidBaseUrl(config.base_url.clone()))?;
        if config.api_key.expose().trim().is_empty() {
            return Err(ProviderClientError::MissingApiKey);
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn create(&self, query: &SearchQuery) -> Result<CreateResponse, CallFailure> {
        let url = self.endpoint(&["search", "create"]);
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .json(query)
            .send()
            .await
            .map_err(request_failure)?;

        // Only 201 opens a session; any other status is a failure.
        let status = response.status();
        if status != StatusCode::CREATED {
            if status.is_success() {
                return Err(CallFailure::http(
                    status.as_u16(),
                    format!("unexpected create status {}", status),
                ));
            }
            return Err(status_failure(response).await);
        }

        response.json::<CreateResponse>().await.map_err(body_failure)
    }

    async fn poll(&self, token: &SessionToken) -> Result<PollResponse, CallFailure> {
        let url = self.endpoint(&["search", "poll", token.as_str()]);
        debug!("GET search/poll/{}", redact_token(token.as_str()));

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .header(ACCEPT, JSON)
            .send()
            .await
            .map_err(request_failure)?;

        if !response.status().is_success() {
            return Err(status_failure(response).await);
        }

        let payload = response.json::<Value>().await.map_err(body_failure)?;
        PollResponse::from_payload(payload)
    }
}

fn request_failure(err: reqwest::Error) -> CallFailure {
    if err.is_timeout() {
        CallFailure::Timeout
    } else {
        CallFailure::Transport(err.to_string())
    }
}

fn body_failure(err: reqwest::Error) -> CallFailure {
    if err.is_timeout() {
        CallFailure::Timeout
    } else {
        CallFailure::Decode(err.to_string())
    }
}

/// Non-2xx: the provider's `message` field becomes the failure message.
async fn status_failure(response: Response) -> CallFailure {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    CallFailure::http(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use skyscout_shared::PollResult;
    use std::time::Duration;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v3/flights/live", addr)
    }

    fn provider(base_url: &str, request_timeout_ms: u64) -> HttpSearchProvider {
        HttpSearchProvider::new(&ProviderConfig {
            base_url: base_url.to_string(),
            api_key: Masked::new("test-key".to_string()),
            connect_timeout_ms: 500,
            request_timeout_ms,
        })
        .unwrap()
    }

    fn query() -> SearchQuery {
        SearchQuery::new("en-US", "USD", 1).with_leg("JFK", "LAX")
    }

    async fn create_handler(
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad key" })));
        }
        assert_eq!(body["queryLegs"][0]["origin"], "JFK");
        (StatusCode::CREATED, Json(json!({ "sessionToken": "abc123" })))
    }

    async fn poll_handler(Path(token): Path<String>) -> (StatusCode, Json<Value>) {
        match token.as_str() {
            "abc123" => (
                StatusCode::OK,
                Json(json!({
                    "status": "RESULT_STATUS_COMPLETE",
                    "flights": [{ "id": "F1", "airline": { "name": "Delta" }, "price": 199.0 }]
                })),
            ),
            "pending" => (StatusCode::OK, Json(json!({ "status": "RESULT_STATUS_INCOMPLETE" }))),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "Session not found" }))),
        }
    }

    fn fake_provider() -> Router {
        Router::new()
            .route("/v3/flights/live/search/create", post(create_handler))
            .route("/v3/flights/live/search/poll/{token}", get(poll_handler))
    }

    #[tokio::test]
    async fn test_create_returns_session_token() {
        let base = serve(fake_provider()).await;
        let created = provider(&base, 2_000).create(&query()).await.unwrap();
        assert_eq!(created.session_token, "abc123");
    }

    #[tokio::test]
    async fn test_poll_complete_and_incomplete() {
        let base = serve(fake_provider()).await;
        let provider = provider(&base, 2_000);

        let done: PollResult = provider.poll(&SessionToken::from("abc123")).await.unwrap().into();
        assert!(done.is_complete());
        assert_eq!(done.flights.len(), 1);
        assert_eq!(done.flights[0].airline.as_deref(), Some("Delta"));

        let pending: PollResult = provider
            .poll(&SessionToken::from("pending"))
            .await
            .unwrap()
            .into();
        assert!(!pending.is_complete());
        assert!(pending.flights.is_empty());
    }

    #[tokio::test]
    async fn test_create_answered_with_200_is_a_failure() {
        let base = serve(Router::new().route(
            "/v3/flights/live/search/create",
            post(|| async { Json(json!({ "sessionToken": "abc123" })) }),
        ))
        .await;
        let failure = provider(&base, 2_000).create(&query()).await.unwrap_err();
        assert!(matches!(failure, CallFailure::Http { status: 200, .. }));
        assert!(!failure.is_retryable());
    }

    #[tokio::test]
    async fn test_error_status_carries_provider_message() {
        let base = serve(fake_provider()).await;
        let failure = provider(&base, 2_000)
            .poll(&SessionToken::from("missing"))
            .await
            .unwrap_err();
        assert_eq!(failure, CallFailure::http(404, "Session not found"));
    }

    #[tokio::test]
    async fn test_wrong_key_is_unauthorized() {
        let base = serve(fake_provider()).await;
        let mut client = provider(&base, 2_000);
        client.api_key = Masked::new("other".to_string());
        let failure = client.create(&query()).await.unwrap_err();
        assert_eq!(failure, CallFailure::http(401, "bad key"));
    }

    #[tokio::test]
    async fn test_server_error_without_body_uses_reason() {
        let base = serve(Router::new().route(
            "/v3/flights/live/search/create",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        let failure = provider(&base, 2_000).create(&query()).await.unwrap_err();
        assert_eq!(failure, CallFailure::http(503, "Service Unavailable"));
        assert!(failure.is_retryable());
    }

    #[tokio::test]
    async fn test_unparseable_body_is_decode_failure() {
        let base = serve(Router::new().route(
            "/v3/flights/live/search/poll/{token}",
            get(|| async { "not json" }),
        ))
        .await;
        let failure = provider(&base, 2_000)
            .poll(&SessionToken::from("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(failure, CallFailure::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let base = serve(Router::new().route(
            "/v3/flights/live/search/create",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::CREATED
            }),
        ))
        .await;
        let failure = provider(&base, 100).create(&query()).await.unwrap_err();
        assert_eq!(failure, CallFailure::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let failure = provider(&format!("http://{}", addr), 2_000)
            .create(&query())
            .await
            .unwrap_err();
        assert!(matches!(failure, CallFailure::Transport(_)));
    }

    #[test]
    fn test_token_is_a_single_path_segment() {
        let provider = provider("https://partners.example.net/v3/flights/live/", 1_000);
        let url = provider.endpoint(&["search", "poll", "a/b c"]);
        assert_eq!(
            url.as_str(),
            "https://partners.example.net/v3/flights/live/search/poll/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        let result = HttpSearchProvider::new(&ProviderConfig {
            base_url: "not a url".to_string(),
            api_key: Masked::new(String::new()),
            connect_timeout_ms: 1,
            request_timeout_ms: 1,
        });
        assert!(matches!(result, Err(ProviderClientError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_rejects_blank_api_key() {
        let result = HttpSearchProvider::new(&ProviderConfig {
            base_url: "https://partners.example.net/v3/flights/live".to_string(),
            api_key: Masked::new("  ".to_string()),
            connect_timeout_ms: 1,
            request_timeout_ms: 1,
        });
        assert!(matches!(result, Err(ProviderClientError::MissingApiKey)));
    }
}
