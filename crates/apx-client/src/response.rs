//! Shared request and response plumbing for the sub-clients.

use apx_core::{Page, PageRequest};
use apx_publish::envelope::{unwrap_list, Unwrapped};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ConfigError;
use crate::error::PortalApiError;

/// `base` joined with percent-encoded path `segments`.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, PortalApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ConfigError::InvalidUrl(base.to_string(), "URL cannot be used as a base".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a transport failure.
pub(crate) fn transport(endpoint: &str) -> impl FnOnce(reqwest::Error) -> PortalApiError + '_ {
    move |source| PortalApiError::Http {
        endpoint: endpoint.to_string(),
        source,
    }
}

/// Check the status and parse the body. An empty 2xx body is `null`.
pub(crate) async fn read_json(endpoint: &str, resp: reqwest::Response) -> Result<Value, PortalApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(endpoint, status = status.as_u16(), "portal returned error status");
        return Err(PortalApiError::api(endpoint, status.as_u16(), body));
    }
    let bytes = resp.bytes().await.map_err(transport(endpoint))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|source| PortalApiError::Deserialization {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Unwrap a list body into a page.
///
/// An unusable body is an error naming the reason, so the caller can show
/// an empty state with a notice.
pub(crate) fn into_page<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
    request: PageRequest,
) -> Result<Page<T>, PortalApiError> {
    match unwrap_list::<T>(body) {
        Unwrapped::Ok { items, total } => Ok(Page { items, total, request }),
        Unwrapped::Empty(reason) => {
            tracing::warn!(endpoint, %reason, "unusable list response");
            Err(PortalApiError::UnusableBody {
                endpoint: endpoint.to_string(),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_percent_encoded() {
        let base = Url::parse("http://127.0.0.1:8080/portal/").unwrap();
        let url = endpoint_url(&base, &["api-definitions", "a b/c", "publish"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/portal/api-definitions/a%20b%2Fc/publish");
    }

    #[test]
    fn unusable_body_is_an_error_with_reason() {
        for body in [serde_json::json!({}), serde_json::Value::Null] {
            let err = into_page::<serde_json::Value>("GET /x", body, PageRequest::default()).unwrap_err();
            match err {
                PortalApiError::UnusableBody { endpoint, reason } => {
                    assert_eq!(endpoint, "GET /x");
                    assert_eq!(reason, apx_publish::EmptyReason::UnrecognizedShape);
                }
                other => panic!("expected UnusableBody, got {other:?}"),
            }
        }
    }

    #[test]
    fn usable_body_keeps_total() {
        let page: Page<u32> =
            into_page("GET /x", serde_json::json!({"content": [1, 2], "totalElements": 9}), PageRequest::default())
                .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total, 9);
    }
}
