//! mplus-archive server entry point.
//!
//! Starts the Axum HTTP server with the character archive and log endpoints.

use mplus_archive::api;
use mplus_archive::app_state::AppState;
use mplus_archive::config::AppConfig;
use mplus_archive::{persistence, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    telemetry::init(config.log_format);
    tracing::info!(addr = %config.listen_addr, backend = ?config.storage_backend, "starting mplus-archive");

    // Build storage; schema failures are logged and the server keeps going
    let storage = persistence::connect(&config).await?;
    if let Err(e) = storage.ensure_schema().await {
        tracing::error!(error = %e, "failed to initialize database, requests may fail until it is reachable");
    }

    let app_state = AppState::new(std::sync::Arc::clone(&storage));
    app_state
        .logger
        .info(
            "Server started",
            Some(serde_json::json!({"version": env!("CARGO_PKG_VERSION")})),
        )
        .await;

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
