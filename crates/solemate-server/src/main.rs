//! # solemate-server
//!
//! Runs the SoleMate HTTP host.
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package solemate-server
//!
//! # Custom configuration and port
//! SOLEMATE_CONFIG=./solemate.toml SOLEMATE_PORT=8080 ./solemate-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use solemate_core::config::DEFAULT_CONFIG_PATH;
use solemate_core::Config;
use solemate_server::state::AppState;
use solemate_server::{api, logging};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    logging::init(config.server.production)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting solemate-server");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;

    let mut app_state = AppState::new(config)?;
    app_state.watcher.activate()?;
    let state = app_state.into_shared();

    let app = api::create_router(Arc::clone(&state));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.write().await.watcher.deactivate();
    info!("Shut down");
    Ok(())
}

/// Loads the configuration from `SOLEMATE_CONFIG` (or the default path) and
/// applies `SOLEMATE_PORT`.
fn load_config() -> anyhow::Result<Config> {
    let path = std::env::var("SOLEMATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config =
        Config::load_or_default(&path).with_context(|| format!("loading configuration {path}"))?;

    if let Ok(port) = std::env::var("SOLEMATE_PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("SOLEMATE_PORT is not a port number: {port}"))?;
    }

    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
