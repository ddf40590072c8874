//! Process lifecycle: connect, bind, serve, drain, close.
//!
//! The listener is bound only after the database answered a ping, so the
//! process never accepts traffic it cannot serve. On a termination signal the
//! server stops accepting connections, in-flight requests get a bounded drain
//! period, and only then is the database connection closed.

pub mod lifecycle;
pub mod router;
pub mod shutdown;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::adapters::{MongoConnection, MongoUserRepository};
use crate::config::Config;
use crate::error::StartupError;
use crate::AppState;

pub use lifecycle::{Lifecycle, Phase};
pub use router::build_router;
pub use shutdown::shutdown_signal;

/// Run the server until `shutdown` resolves.
///
/// Returns an error for every startup failure; the caller exits non-zero.
/// A shutdown that arrives while the startup ping is pending abandons the
/// connection attempt and returns `Ok` without binding.
pub async fn run<F>(config: Config, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send,
{
    let lifecycle = Lifecycle::new();

    // Polling the signal future here installs its handlers before the ping starts
    tokio::pin!(shutdown);
    let connection = tokio::select! {
        result = MongoConnection::connect(&config) => match result {
            Ok(connection) => connection,
            Err(e) => {
                let _ = lifecycle.advance(Phase::Closed);
                return Err(e.into());
            }
        },
        _ = &mut shutdown => {
            tracing::info!("Shutdown requested before the database connection was established");
            let _ = lifecycle.advance(Phase::Closed);
            return Ok(());
        }
    };

    let addr = config.bind_addr();
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(source) => {
            tracing::error!("Failed to bind {}: {}", addr, source);
            connection.close(true).await;
            let _ = lifecycle.advance(Phase::Closed);
            return Err(StartupError::Bind { addr, source });
        }
    };

    let state = AppState::new(
        Arc::new(MongoUserRepository::new(connection.clone())),
        lifecycle.clone(),
        connection.subscribe(),
    );

    serve(
        listener,
        build_router(state),
        &connection,
        &lifecycle,
        config.shutdown_timeout,
        shutdown,
    )
    .await
}

/// Serve `app` on `listener` until `shutdown` resolves, then drain and close.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    connection: &MongoConnection,
    lifecycle: &Lifecycle,
    drain_timeout: Duration,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send,
{
    let port = listener
        .local_addr()
        .map_err(StartupError::Serve)?
        .port();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    if let Err(e) = lifecycle.advance(Phase::Listening) {
        tracing::warn!("{}", e);
    }
    tracing::info!("Server is running on port: {}", port);

    let early_exit = tokio::select! {
        result = &mut server => Some(result),
        _ = shutdown => None,
    };

    if let Err(e) = lifecycle.advance(Phase::Draining) {
        tracing::warn!("{}", e);
    }

    if let Some(result) = early_exit {
        connection.close(true).await;
        let _ = lifecycle.advance(Phase::Closed);
        return match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StartupError::Serve(e)),
            Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
        };
    }

    tracing::info!(
        timeout_secs = drain_timeout.as_secs_f64(),
        "Shutdown requested, draining in-flight requests"
    );
    let _ = stop_tx.send(());

    let drained = match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(Ok(Ok(()))) => true,
        Ok(Ok(Err(e))) => {
            tracing::warn!("Server error while draining: {}", e);
            true
        }
        Ok(Err(e)) => {
            tracing::warn!("Server task failed while draining: {}", e);
            true
        }
        Err(_) => {
            tracing::warn!("Drain timeout elapsed, dropping in-flight requests");
            server.abort();
            false
        }
    };

    connection.close(!drained).await;

    if let Err(e) = lifecycle.advance(Phase::Closed) {
        tracing::warn!("{}", e);
    }
    Ok(())
}
