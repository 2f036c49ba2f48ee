//! Portal API client configuration.
//!
//! One base URL for the portal backend plus an optional bearer token.
//! Defaults point at a locally running `apx-stub`. Override via environment
//! variables or explicit construction.

use url::Url;
use zeroize::Zeroizing;

use crate::retry::DEFAULT_READ_RETRIES;

/// Base URL used when `APX_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Request timeout used when `APX_TIMEOUT_SECS` is unset or unparsable.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the portal backend.
///
/// Custom `Debug` implementation redacts the `api_token` field.
#[derive(Clone)]
pub struct PortalApiConfig {
    /// Backend root. Always ends in `/` so relative routes join under it.
    pub base_url: Url,
    /// Bearer token, zeroed on drop.
    pub api_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries of a list read after a transport failure.
    pub read_retries: u32,
}

impl std::fmt::Debug for PortalApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("read_retries", &self.read_retries)
            .finish()
    }
}

impl PortalApiConfig {
    /// Build a configuration from explicit parts.
    pub fn new(base_url: &str, api_token: Option<String>, timeout_secs: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("base_url", base_url)?,
            api_token: api_token.filter(|t| !t.is_empty()).map(Zeroizing::new),
            timeout_secs,
            read_retries: DEFAULT_READ_RETRIES,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `APX_BASE_URL` (default: `http://127.0.0.1:8080`)
    /// - `APX_API_TOKEN` (optional)
    /// - `APX_TIMEOUT_SECS` (default: 30)
    /// - `APX_READ_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("APX_BASE_URL", DEFAULT_BASE_URL)?,
            api_token: std::env::var("APX_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            timeout_secs: std::env::var("APX_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            read_retries: std::env::var("APX_READ_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_READ_RETRIES),
        })
    }

    /// Configuration pointing at a local stub (for testing).
    pub fn local_mock(port: u16, token: Option<&str>) -> Result<Self, ConfigError> {
        Self::new(
            &format!("http://127.0.0.1:{port}"),
            token.map(str::to_string),
            5,
        )
    }

    /// Set the number of read retries.
    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    /// Replace the base URL, keeping token and timeout.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url("base_url", base_url)?;
        Ok(self)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_base_url(var, &raw)
}

fn parse_base_url(source: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(source.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            source.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("API token contains characters not allowed in an HTTP header")]
    InvalidToken,
}
