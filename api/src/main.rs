//! Storefront API Server
//!
//! Bootstraps the HTTP API: configuration, the shared MongoDB connection,
//! CORS and JSON middleware, the user and product routes, a terminal error
//! handler, and signal-driven graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod config;
mod domain;
mod error;
mod handlers;
mod middleware;
mod server;

#[cfg(test)]
mod test_utils;

use adapters::ConnectionState;
use config::Config;
use domain::ports::UserRepository;
use middleware::ErrorCounter;
use server::Lifecycle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub lifecycle: Lifecycle,
    pub database: watch::Receiver<ConnectionState>,
    pub errors: ErrorCounter,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        lifecycle: Lifecycle,
        database: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            users,
            lifecycle,
            database,
            errors: ErrorCounter::default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; nothing else runs without a connection string
    let config = Config::from_env().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    tracing::info!("Starting storefront API...");

    server::run(config, server::shutdown_signal())
        .await
        .context("server failed to start")?;

    Ok(())
}
