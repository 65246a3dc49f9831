mod api;
mod config;
mod error;
mod events;
mod main_lib;

use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smartpower_api::UsageApiClient;
use smartpower_storage_sqlite::SqliteKeyValueStore;

use crate::config::ServerConfig;

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let config = ServerConfig::from_env()?;
    tracing::info!("Backend {} (timeout {:?})", config.api_url, config.request_timeout);

    let backend = Arc::new(UsageApiClient::new(&config.api_url, config.request_timeout));
    let store = Arc::new(SqliteKeyValueStore::open(&config.db_path)?);
    let state = main_lib::build_state(
        backend,
        store,
        config.user_id.as_deref(),
        &config.sync_config(),
    )?;

    state.scheduler.start(config.refresh_interval).await?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api/v1", api::router())
        .with_state(Arc::clone(&state))
        .layer(cors);

    tracing::info!("Server starting on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.scheduler.stop().await;
    tracing::info!("Server stopped");
    Ok(())
}
