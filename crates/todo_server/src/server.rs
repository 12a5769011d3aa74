use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::routes::{SharedStore, create_router};

/// Serves the todo API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the underlying accept loop fails.
pub async fn serve<F>(listener: TcpListener, store: SharedStore, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Binds `addr` and serves in a background task, returning the bound
/// address. Used by the binary's tests and by client end-to-end tests.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    store: SharedStore,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, store, std::future::pending()).await {
            tracing::error!(error = %e, "todo server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
