//! Portal API client error types.

use apx_publish::EmptyReason;

/// Errors from portal API calls.
#[derive(Debug, thiserror::Error)]
pub enum PortalApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The backend returned a non-2xx status. `body` is kept verbatim;
    /// `message` is the backend's own `message` field when it sent one.
    #[error("{endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
        body: String,
    },
    /// Response body was not JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// A 2xx list response whose body could not be unwrapped.
    #[error("unusable response from {endpoint}: {reason}")]
    UnusableBody {
        endpoint: String,
        reason: EmptyReason,
    },
    /// The request could not be built.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl PortalApiError {
    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn api(endpoint: &str, status: u16, body: String) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.clone());
        Self::Api {
            endpoint: endpoint.to_string(),
            status,
            message,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_backend_message() {
        let err = PortalApiError::api(
            "POST /publish",
            409,
            r#"{"code":"CONFLICT","message":"already published to Edge"}"#.to_string(),
        );
        assert_eq!(err.to_string(), "POST /publish returned 409: already published to Edge");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn unusable_body_names_endpoint_and_reason() {
        let err = PortalApiError::UnusableBody {
            endpoint: "GET api-definitions/a/publish-records".into(),
            reason: EmptyReason::MalformedItem {
                index: 1,
                message: "invalid createdAt".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "unusable response from GET api-definitions/a/publish-records: \
             list item 1 could not be decoded: invalid createdAt"
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = PortalApiError::api("GET /gateways", 500, "upstream exploded".to_string());
        match err {
            PortalApiError::Api { message, body, .. } => {
                assert_eq!(message, "upstream exploded");
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
