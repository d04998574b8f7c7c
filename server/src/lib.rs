//! Reference chat server for the scenario suite.
//!
//! Serves a WebSocket endpoint at `/ws` that answers `ping` with `pong`,
//! acknowledges chat messages and relays them to the other connected
//! clients, plus a `/health` probe. Integration tests spawn it in-process on
//! an ephemeral port; the binary serves it on `PORT`.

pub mod routes;
pub mod state;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::state::AppState;

/// Port served when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
    #[error("server io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read `PORT` from the environment, falling back to [`DEFAULT_PORT`].
///
/// # Errors
///
/// Returns [`ServerError::InvalidPort`] when `PORT` is set but not a `u16`.
pub fn port_from_env() -> Result<u16, ServerError> {
    match std::env::var("PORT") {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ServerError::InvalidPort(raw)),
        _ => Ok(DEFAULT_PORT),
    }
}

/// Serve on `listener` until the process stops.
///
/// # Errors
///
/// Returns an error if the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    info!(%addr, "chat server listening");
    axum::serve(listener, routes::app(state)).await?;
    Ok(())
}

/// Bind `addr` and serve in a background task. Returns the bound address,
/// so `127.0.0.1:0` yields a usable ephemeral port.
///
/// # Errors
///
/// Returns an error if binding fails.
pub async fn spawn(addr: &str) -> Result<SocketAddr, ServerError> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = serve(listener, AppState::new()).await {
            error!(error = %e, "chat server stopped");
        }
    });
    Ok(local)
}
