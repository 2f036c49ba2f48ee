//! # apx-client: Typed Rust client for the APX portal publish API
//!
//! Provides typed access to the three publish resources of an API
//! Definition:
//! - **Records** (`records.rs`): list, publish, unpublish
//! - **History** (`history.rs`): the append-only publish log
//! - **Gateways** (`gateways.rs`): the directory of publish targets
//!
//! `PortalClient` implements [`apx_publish::PublishBackend`], so a
//! [`apx_publish::PublishController`] can drive the real backend directly.
//!
//! ## Retry Policy
//!
//! Reads retry on transport errors with exponential backoff, as many times
//! as `PortalApiConfig::read_retries` allows. Publish and unpublish are
//! sent exactly once; a lost response is reconciled by the
//! controller's re-fetch, never by resending.
//!
//! ## Response Shapes
//!
//! Each list endpoint may wrap its payload differently. Bodies are
//! unwrapped through [`apx_publish::envelope`]; an unusable body is a
//! [`PortalApiError::UnusableBody`] carrying the reason. The controller
//! renders it as an empty state plus an error notice, and refuses to
//! publish on it.

pub mod config;
pub mod error;
pub mod gateways;
pub mod history;
pub mod records;
pub(crate) mod response;
pub mod retry;

pub use config::PortalApiConfig;
pub use error::PortalApiError;
pub use retry::ReadRetry;

use std::time::Duration;

use apx_core::{ApiDefinitionId, Page, PageRequest, PublishRecordId};
use apx_publish::{Gateway, PublishBackend, PublishHistoryEntry, PublishRecord, PublishRequest};

/// Top-level portal client. Holds one sub-client per resource.
#[derive(Debug, Clone)]
pub struct PortalClient {
    records: records::RecordClient,
    history: history::HistoryClient,
    gateways: gateways::GatewayClient,
}

impl PortalClient {
    /// Create a new client from configuration.
    pub fn new(config: PortalApiConfig) -> Result<Self, PortalApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|_| PortalApiError::Config(config::ConfigError::InvalidToken))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| PortalApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let retry = ReadRetry::with_retries(config.read_retries);
        Ok(Self {
            records: records::RecordClient::new(http.clone(), config.base_url.clone(), retry),
            history: history::HistoryClient::new(http.clone(), config.base_url.clone(), retry),
            gateways: gateways::GatewayClient::new(http, config.base_url, retry),
        })
    }

    /// Publish records client.
    pub fn records(&self) -> &records::RecordClient {
        &self.records
    }

    /// Publish history client.
    pub fn history(&self) -> &history::HistoryClient {
        &self.history
    }

    /// Gateway directory client.
    pub fn gateways(&self) -> &gateways::GatewayClient {
        &self.gateways
    }
}

impl PublishBackend for PortalClient {
    type Error = PortalApiError;

    async fn list_records(&self, api: &ApiDefinitionId, page: PageRequest) -> Result<Page<PublishRecord>, PortalApiError> {
        self.records.list(api, page).await
    }

    async fn list_history(
        &self,
        api: &ApiDefinitionId,
        page: PageRequest,
    ) -> Result<Page<PublishHistoryEntry>, PortalApiError> {
        self.history.list(api, page).await
    }

    async fn list_gateways(&self, size: u32) -> Result<Vec<Gateway>, PortalApiError> {
        self.gateways.list(size).await
    }

    async fn publish(&self, api: &ApiDefinitionId, request: &PublishRequest) -> Result<(), PortalApiError> {
        self.records.publish(api, request).await.map(|_| ())
    }

    async fn unpublish(&self, api: &ApiDefinitionId, record: &PublishRecordId) -> Result<(), PortalApiError> {
        self.records.unpublish(api, record).await
    }
}
