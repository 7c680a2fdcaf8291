//! MatSync - product/material-master synchronization service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use matsync_server::utils::logging::init_tracing;
use matsync_server::{build_router, AppContext};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading RUST_LOG or MATSYNC_* variables
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => info!(reason = %err, "No .env file loaded"),
    }

    let config = matsync_infra::config::load().context("failed to load configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    info!("MatSync starting...");
    let ctx = Arc::new(AppContext::new(config).await.context("failed to initialise context")?);
    ctx.start_background().await.context("failed to start background tasks")?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "MatSync listening");

    let served = axum::serve(listener, build_router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    ctx.shutdown().await;
    served.context("HTTP server error")?;
    info!("MatSync stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
