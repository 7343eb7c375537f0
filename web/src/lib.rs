//! HTTP surface of the service: routes, CORS and the listener.

use log::*;
use std::future::IntoFuture;
use tokio::net::TcpListener;

pub use service::AppState;

mod controller;
pub mod router;

/// Binds the configured interface and port and serves until Ctrl-C.
///
/// Event streams are long-lived, so shutdown does not wait for open
/// connections to drain; dropping them ends every session as a disconnect.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_addr = format!(
        "{}:{}",
        app_state.config.interface(),
        app_state.config.port
    );
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    let router = router::define_routes(app_state);

    tokio::select! {
        served = axum::serve(listener, router).into_future() => served,
        _ = shutdown_signal() => {
            info!("Shutdown signal received, closing all event streams");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
