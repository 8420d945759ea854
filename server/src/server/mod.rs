//! HTTP server bootstrap: binds a TCP listener and serves the payment API
//! until the process receives a shutdown signal.

pub(crate) mod api;
mod state;

use std::{io, net::SocketAddr};

use log::info;
use moneta_gate::{driver::Gateway, store::Store, wallet::Wallet};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Bind `listen_address` and serve the payment API until a shutdown signal
/// (Ctrl+C, or SIGTERM on unix) is received.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub(crate) async fn serve<W, S>(listen_address: SocketAddr, gateway: Gateway<W, S>) -> io::Result<()>
where
    W: Wallet + 'static,
    S: Store + 'static,
{
    let listener = TcpListener::bind(listen_address).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router_for(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Serve the payment API on an already-bound `listener`, until `listener`'s
/// task is dropped or aborted. Used by integration tests, which need the
/// bound address before the server starts accepting connections and cannot
/// rely on a process-level shutdown signal to stop the server afterwards.
#[doc(hidden)]
pub async fn serve_on<W, S>(listener: TcpListener, gateway: Gateway<W, S>) -> io::Result<()>
where
    W: Wallet + 'static,
    S: Store + 'static,
{
    axum::serve(listener, router_for(gateway)).await
}

fn router_for<W, S>(gateway: Gateway<W, S>) -> axum::Router
where
    W: Wallet + 'static,
    S: Store + 'static,
{
    let state = AppState::new(gateway);
    api::router(state).layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
