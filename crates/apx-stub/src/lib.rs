//! # apx-stub: In-Memory Portal Backend
//!
//! A development and test backend for the publish endpoints `apx-client`
//! calls. It owns the authoritative publish state machine, enforces the
//! one-active-gateway rule server-side, and logs every action to an
//! append-only history.
//!
//! Storage is in-memory (DashMap) with no persistence; data is lost on
//! restart.
//!
//! A gateway whose id starts with `fail-` rejects every publish, which
//! exercises the FAILED path end to end.

pub mod routes;
pub mod store;

pub use routes::router;
pub use store::{default_gateways, AppState, StubError, FAILING_GATEWAY_PREFIX};

/// Serve the stub on an already-bound listener until the task is dropped.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state).into_make_service()).await
}
