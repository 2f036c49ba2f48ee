//! Portal stub server, standalone development server.
//!
//! Listens on `APX_STUB_PORT` (default 8080) with the default gateway
//! directory. Log filter from `RUST_LOG`, default `info`.

use std::net::SocketAddr;
use std::process::ExitCode;

use apx_stub::{default_gateways, serve, AppState};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port: u16 = std::env::var("APX_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let state = AppState::with_gateways(default_gateways());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("apx-stub listening on {addr}");

    match serve(listener, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}
