//! Serve command - runs the forecast HTTP service.

use std::sync::Arc;

use anyhow::{Context, Result};
use config::Config;
use database::sink_from_config;
use tracing::info;

use crate::model_store;
use crate::server::{self, AppState};

/// Runs the serve command.
///
/// Loads the model artifact once, selects the persistence sink, and
/// blocks serving HTTP until the process is stopped.
///
/// # Errors
///
/// Returns an error if the bind address is unusable or the server
/// terminates unexpectedly. A missing model is not an error; the service
/// starts degraded and reports it through the health endpoint.
pub async fn run(bind: &str) -> Result<()> {
    let config = Config::from_env();

    let model = model_store::load(&config.base_path);
    let sink = sink_from_config(&config.db);
    let state = Arc::new(AppState { model, sink });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "Forecast service listening");

    axum::serve(listener, server::router(state))
        .await
        .context("HTTP server terminated")
}
