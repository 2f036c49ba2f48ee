//! Backoff for idempotent portal reads.
//!
//! Only GETs go through [`ReadRetry::get`]. A transport failure (connect,
//! timeout) is retried; a response of any status, 5xx included, is handed
//! back on the attempt that produced it. Publish and unpublish are sent
//! once by their callers and never come through here.

use std::time::Duration;

use url::Url;

use crate::error::PortalApiError;

/// Retries after the first attempt unless configured otherwise.
pub const DEFAULT_READ_RETRIES: u32 = 3;

const BASE_DELAY: Duration = Duration::from_millis(200);

/// Retry schedule for list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetry {
    /// Attempts after the first.
    pub retries: u32,
    /// Wait before the first retry. Doubles for each one after.
    pub base_delay: Duration,
}

impl Default for ReadRetry {
    fn default() -> Self {
        Self::with_retries(DEFAULT_READ_RETRIES)
    }
}

impl ReadRetry {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            base_delay: BASE_DELAY,
        }
    }

    /// Wait before zero-based retry `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// GET `url` with `query`. Transport errors come back tagged with
    /// `endpoint` once the retries are spent.
    pub(crate) async fn get(
        &self,
        http: &reqwest::Client,
        endpoint: &str,
        url: &Url,
        query: &[(&str, u32)],
    ) -> Result<reqwest::Response, PortalApiError> {
        let mut attempt = 0;
        loop {
            let source = match http.get(url.clone()).query(query).send().await {
                Ok(resp) => return Ok(resp),
                Err(source) => source,
            };
            let err = PortalApiError::Http {
                endpoint: endpoint.to_string(),
                source,
            };
            if attempt >= self.retries {
                return Err(err);
            }
            let delay = self.delay(attempt);
            attempt += 1;
            tracing::warn!(attempt, retries = self.retries, ?delay, error = %err, "portal read failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}
