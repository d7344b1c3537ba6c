//! HTTP server for the contact manager.
//!
//! Exposes the contact service as a JSON API over axum, including the CSV
//! bulk upload endpoint.

pub mod handlers;
pub mod upload;

pub use handlers::{router, ApiResponse, AppState, FieldError};
pub use upload::{import_candidates, UploadReport, UploadStop, UPLOAD_FIELD};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::info;

/// Run the HTTP server until Ctrl-C.
///
/// # Arguments
/// * `addr` - Address to listen on
/// * `state` - Shared handler state
///
/// # Returns
/// An error if the listener cannot bind or the server fails
pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("HTTP server shutting down");
}
