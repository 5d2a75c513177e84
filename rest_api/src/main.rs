// rest_api/src/main.rs

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use rest_api::{AppConfig, AppState, app, ensure_bootstrap_admin};
use storage::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT configuration")?;

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    tracing::info!(path = %config.database_path, "database ready");

    let state = AppState::new(db, config);
    ensure_bootstrap_admin(&state)
        .await
        .map_err(|e| anyhow::anyhow!("bootstrap admin setup failed: {e}"))?;

    let router = app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("clinic API listening on {addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received shutdown signal");
}
