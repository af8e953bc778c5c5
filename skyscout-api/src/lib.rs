use axum::{http::Method, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod middleware;
pub mod search;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::USER_AGENT,
        ])
        .expose_headers([
            axum::http::header::RETRY_AFTER,
            middleware::request_id::REQUEST_ID_HEADER,
        ]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(search::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::request_id::add_request_id))
        .with_state(state)
}

async fn root() -> &'static str {
    "Welcome to the SkyScout flight search API"
}

async fn health() -> &'static str {
    "ok"
}
