//! Sentra Server — application entry point.

mod config;
mod error;
mod mailer;
mod routes;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use sentra_store::MemoryStore;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sentra=info".parse()?))
        .json()
        .init();

    let config = ServerConfig::from_env()?;
    let store = MemoryStore::new();
    let state = AppState::new(store, &config)?;
    let app = routes::router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting Sentra server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
