use anyhow::Context;
use skyscout_api::{app, AppState};
use skyscout_core::SessionStore;
use skyscout_search::{InMemorySessionStore, ResilienceState, SearchOrchestrator};
use skyscout_store::app_config::{Config, SessionBackend};
use skyscout_store::{HttpSearchProvider, RedisSessionStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skyscout_api=debug,skyscout_search=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting SkyScout API on port {}", config.server.port);

    let provider =
        HttpSearchProvider::new(&config.provider).context("Failed to build provider client")?;

    let sessions: Arc<dyn SessionStore> = match config.sessions.backend {
        SessionBackend::Memory => {
            tracing::info!(
                "Keeping search sessions in memory (ttl {}s)",
                config.sessions.ttl_secs
            );
            Arc::new(InMemorySessionStore::with_ttl(Duration::from_secs(
                config.sessions.ttl_secs,
            )))
        }
        SessionBackend::Redis => {
            let url = config
                .sessions
                .redis_url
                .as_deref()
                .context("sessions.redis_url is required for the redis session backend")?;
            tracing::info!(
                "Keeping search sessions in Redis (ttl {}s)",
                config.sessions.ttl_secs
            );
            let store =
                RedisSessionStore::new(url, config.sessions.ttl_secs).context("Invalid Redis url")?;
            Arc::new(store)
        }
    };

    let resilience = Arc::new(ResilienceState::new(&config.resilience));
    let orchestrator = SearchOrchestrator::new(Arc::new(provider), sessions, resilience);

    let app = app(AppState::new(orchestrator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
