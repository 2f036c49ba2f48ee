//! Typed client for publish records and the publish/unpublish actions.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `api-definitions/{id}/publish-records?page&size` | List records |
//! | POST   | `api-definitions/{id}/publish` | Publish |
//! | DELETE | `api-definitions/{id}/publish/{recordId}` | Unpublish |
//!
//! `page` on the wire is zero-based.

use apx_core::{ApiDefinitionId, Page, PageRequest, PublishRecordId};
use apx_publish::envelope::unwrap_one;
use apx_publish::{PublishRecord, PublishRequest};

use crate::error::PortalApiError;
use crate::response::{endpoint_url, into_page, read_json, transport};
use crate::retry::ReadRetry;

/// Client for publish records.
#[derive(Debug, Clone)]
pub struct RecordClient {
    http: reqwest::Client,
    base_url: url::Url,
    retry: ReadRetry,
}

impl RecordClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, retry: ReadRetry) -> Self {
        Self { http, base_url, retry }
    }

    /// List the publish records of an API Definition.
    pub async fn list(&self, api: &ApiDefinitionId, request: PageRequest) -> Result<Page<PublishRecord>, PortalApiError> {
        let endpoint = format!("GET api-definitions/{api}/publish-records");
        let url = endpoint_url(&self.base_url, &["api-definitions", api.as_str(), "publish-records"])?;
        let query = [("page", request.wire_page()), ("size", request.size())];

        let resp = self.retry.get(&self.http, &endpoint, &url, &query).await?;
        let body = read_json(&endpoint, resp).await?;
        into_page(&endpoint, body, request)
    }

    /// Publish an API Definition. Not retried.
    ///
    /// Returns the record from the response body when the backend sends
    /// one.
    pub async fn publish(
        &self,
        api: &ApiDefinitionId,
        body: &PublishRequest,
    ) -> Result<Option<PublishRecord>, PortalApiError> {
        let endpoint = format!("POST api-definitions/{api}/publish");
        let url = endpoint_url(&self.base_url, &["api-definitions", api.as_str(), "publish"])?;
        tracing::debug!(%endpoint, gateway_id = %body.gateway_id, "sending publish");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport(&endpoint))?;
        let body = read_json(&endpoint, resp).await?;
        Ok(unwrap_one(body))
    }

    /// Unpublish one record. Not retried.
    pub async fn unpublish(&self, api: &ApiDefinitionId, record: &PublishRecordId) -> Result<(), PortalApiError> {
        let endpoint = format!("DELETE api-definitions/{api}/publish/{record}");
        let url = endpoint_url(
            &self.base_url,
            &["api-definitions", api.as_str(), "publish", record.as_str()],
        )?;
        tracing::debug!(%endpoint, "sending unpublish");

        let resp = self.http.delete(url).send().await.map_err(transport(&endpoint))?;
        read_json(&endpoint, resp).await?;
        Ok(())
    }
}
