//! Shared harness: a live apx-stub on an ephemeral port.

#![allow(dead_code)]

use apx_client::{PortalApiConfig, PortalClient};
use apx_core::ApiDefinitionId;
use apx_publish::{PublishController, PublishForm};
use apx_stub::{default_gateways, AppState};

/// A running stub. The server shuts down when this is dropped.
pub struct StubServer {
    pub port: u16,
    pub state: AppState,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl StubServer {
    /// Start a stub with the default gateway directory.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let state = AppState::with_gateways(default_gateways());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let app = apx_stub::router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
                .ok();
        });

        // Wait for the server to be ready.
        let health = reqwest::Client::new();
        for _ in 0..50 {
            if health
                .get(format!("http://127.0.0.1:{port}/health"))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        Self {
            port,
            state,
            _shutdown: tx,
        }
    }

    pub fn client(&self) -> PortalClient {
        PortalClient::new(PortalApiConfig::local_mock(self.port, None).unwrap()).unwrap()
    }

    pub fn controller(&self, api: &str) -> PublishController<PortalClient> {
        PublishController::new(self.client(), api_id(api))
    }
}

pub fn api_id(raw: &str) -> ApiDefinitionId {
    ApiDefinitionId::new(raw).unwrap()
}

pub fn form(gateway: &str, base_path: &str) -> PublishForm {
    PublishForm {
        gateway_id: Some(gateway.into()),
        base_path: Some(base_path.into()),
        domains: Some("api.example.com".into()),
        comment: None,
    }
}
