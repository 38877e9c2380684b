use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use tokio::signal;
use tracing::info;
use warp::{Filter, Reply};

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod front;
pub mod game;
pub mod gateway;
pub mod identity;
pub mod score;
pub mod user_path;
pub mod users;

/// Run a service's routes until SIGINT or SIGTERM.
pub async fn serve<F>(routes: F, addr: SocketAddr) -> Result<(), warp::Error>
where
    F: Filter<Error = Infallible> + Clone + Send + Sync + 'static,
    F::Extract: Reply,
{
    let (addr, server) = bind(routes, addr, shutdown_signal())?;

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}

/// Bind `routes` to `addr`; the returned future serves until `signal`
/// resolves. Port 0 picks a free port.
pub fn bind<F>(
    routes: F,
    addr: SocketAddr,
    signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + 'static), warp::Error>
where
    F: Filter<Error = Infallible> + Clone + Send + Sync + 'static,
    F::Extract: Reply,
{
    warp::serve(routes).try_bind_with_graceful_shutdown(addr, signal)
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to listen for SIGINT");
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to listen for SIGTERM");

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
