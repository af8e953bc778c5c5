pub mod app_config;
pub mod provider_client;
pub mod session_repo;

pub use app_config::Config;
pub use provider_client::HttpSearchProvider;
pub use session_repo::RedisSessionStore;
