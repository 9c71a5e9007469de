//! Application entry point.

use std::time::Duration;

use toollink_core::ToolLinkError;
use toollink_db::{DbError, DbManager, run_migrations};
use toollink_server::{AppState, ServerConfig, routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ToolLinkError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("toollink=info")),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;

    let manager = DbManager::connect(&config.db)
        .await
        .map_err(DbError::from)?;
    run_migrations(manager.client()).await?;

    let state = AppState::new(
        manager.client().clone(),
        config.auth.clone(),
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| ToolLinkError::Internal(format!("failed to bind {}: {e}", config.bind_addr)))?;
    tracing::info!(addr = %config.bind_addr, "toollink server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| ToolLinkError::Internal(format!("server error: {e}")))?;

    Ok(())
}
