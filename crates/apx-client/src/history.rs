//! Typed client for the publish history log.
//!
//! `GET api-definitions/{id}/publish-history?page&size`, zero-based `page`.

use apx_core::{ApiDefinitionId, Page, PageRequest};
use apx_publish::PublishHistoryEntry;

use crate::error::PortalApiError;
use crate::response::{endpoint_url, into_page, read_json};
use crate::retry::ReadRetry;

/// Client for publish history.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    http: reqwest::Client,
    base_url: url::Url,
    retry: ReadRetry,
}

impl HistoryClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, retry: ReadRetry) -> Self {
        Self { http, base_url, retry }
    }

    /// One page of history entries, in backend order.
    pub async fn list(
        &self,
        api: &ApiDefinitionId,
        request: PageRequest,
    ) -> Result<Page<PublishHistoryEntry>, PortalApiError> {
        let endpoint = format!("GET api-definitions/{api}/publish-history");
        let url = endpoint_url(&self.base_url, &["api-definitions", api.as_str(), "publish-history"])?;
        let query = [("page", request.wire_page()), ("size", request.size())];

        let resp = self.retry.get(&self.http, &endpoint, &url, &query).await?;
        let body = read_json(&endpoint, resp).await?;
        into_page(&endpoint, body, request)
    }
}
