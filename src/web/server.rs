//! HTTP server startup and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::sync::Notify;
#[cfg(unix)]
use tokio::signal::unix;

use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Binds `server_config`'s address and serves `app` until Ctrl+C or SIGTERM,
/// then waits at most the shutdown timeout for in-flight requests.
pub async fn serve(app: Router, server_config: ServerConfig) -> Result<()> {
    let server_addr = server_config.server_addr();
    log::info!(
        "server configuration host={} port={} shutdown_timeout_sec={}",
        server_config.host,
        server_config.port,
        server_config.shutdown_timeout
    );

    let listener = TcpListener::bind(server_addr).await.map_err(|source| {
        log::error!("failed to bind to {server_addr}: {source}");
        Error::Bind {
            address: server_addr.to_string(),
            source,
        }
    })?;

    log::info!("listening on http://{server_addr}");
    if server_config.binds_to_all_interfaces() {
        log::warn!(
            "server is bound to all interfaces, ensure firewall rules are properly configured"
        );
    }

    let shutdown_timeout = server_config.shutdown_timeout();
    if serve_until(listener, app, shutdown_signal(), shutdown_timeout).await? {
        log::info!("server shut down gracefully");
    } else {
        log::warn!(
            "requests still in flight after {}s, shutting down anyway",
            shutdown_timeout.as_secs()
        );
    }
    Ok(())
}

/// Serves until `signal` resolves, then gives in-flight requests at most
/// `shutdown_timeout` to finish. Returns whether they all finished.
async fn serve_until(
    listener: TcpListener,
    app: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    shutdown_timeout: Duration,
) -> Result<bool> {
    let signalled = Arc::new(Notify::new());
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let signalled = signalled.clone();
        async move {
            signal.await;
            signalled.notify_one();
        }
    })
    .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result?;
            Ok(true)
        }
        () = signalled.notified() => {
            log::info!(
                "graceful shutdown initiated timeout_secs={}",
                shutdown_timeout.as_secs()
            );
            match tokio::time::timeout(shutdown_timeout, &mut server).await {
                Ok(result) => {
                    result?;
                    Ok(true)
                }
                Err(_) => Ok(false),
            }
        }
    }
}

/// Waits for a shutdown signal (SIGTERM or SIGINT/Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {e}");
        } else {
            log::info!("received Ctrl+C signal, initiating graceful shutdown");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                log::info!("received SIGTERM signal, initiating graceful shutdown");
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {e}");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
