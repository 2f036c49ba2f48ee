//! Typed client for the gateway directory.
//!
//! `GET gateways?page=0&size={n}`. Only the first page is read; callers
//! pick a size large enough for the whole directory.

use apx_core::PageRequest;
use apx_publish::Gateway;

use crate::error::PortalApiError;
use crate::response::{endpoint_url, into_page, read_json};
use crate::retry::ReadRetry;

/// Client for the gateway directory.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: url::Url,
    retry: ReadRetry,
}

impl GatewayClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, retry: ReadRetry) -> Self {
        Self { http, base_url, retry }
    }

    /// Gateways available as publish targets.
    pub async fn list(&self, size: u32) -> Result<Vec<Gateway>, PortalApiError> {
        let endpoint = "GET gateways";
        let url = endpoint_url(&self.base_url, &["gateways"])?;
        let request = PageRequest::first(size);
        let query = [("page", request.wire_page()), ("size", request.size())];

        let resp = self.retry.get(&self.http, endpoint, &url, &query).await?;
        let body = read_json(endpoint, resp).await?;
        Ok(into_page(endpoint, body, request)?.items)
    }
}
