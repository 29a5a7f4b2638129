//! HTTP API Module
//!
//! Serves the cached rate and gold snapshots as JSON.
//! Only compiled when the `api` feature is enabled.

mod error;
mod routes;
mod types;

pub use error::ApiError;
pub use routes::create_router;
pub use types::*;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::rates::RatesService;

/// Bind and serve until Ctrl-C
pub async fn start_server(service: Arc<RatesService>, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_router(service, config.cors_enabled);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    tracing::info!("API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
