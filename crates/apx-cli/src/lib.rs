//! # apx-cli: Command-line tool for APX publish operations
//!
//! Provides the `apx` binary. Every subcommand talks to the portal backend
//! through [`apx_client::PortalClient`]; mutating subcommands go through a
//! [`apx_publish::PublishController`] so the one-active-gateway rule and the
//! re-fetch after every action apply exactly as they do in the portal.
//!
//! ## Subcommands
//!
//! - `apx gateways`: List gateways available as publish targets.
//! - `apx records`: Show the publish records of an API Definition.
//! - `apx history`: Page through the publish history.
//! - `apx publish`: Publish an API Definition to a gateway.
//! - `apx unpublish`: Unpublish an ACTIVE record.
//! - `apx diff`: Compare a history entry's snapshot with the latest
//!   active one.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Backend, transport, or read failure |
//! | 2 | Invalid publish form or blocked by the publish policy |
//!
//! ```bash
//! apx records api-42
//! apx publish api-42 --gateway gw-higress --base-path /v1 --domains "a.com, b.com"
//! apx history api-42 --page 2 --size 20
//! ```

pub mod diff;
pub mod listing;
pub mod publish;
pub mod render;

use anyhow::{Context as _, Result};
use serde::Serialize;

use apx_client::{PortalApiConfig, PortalClient};
use apx_core::ApiDefinitionId;
use apx_publish::{Notice, NoticeLevel, PublishController};

/// Exit code for invalid input or a policy refusal.
pub const EXIT_REJECTED: u8 = 2;

/// Shared state for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Context {
    client: PortalClient,
    json: bool,
}

impl Context {
    pub fn new(config: PortalApiConfig, json: bool) -> Result<Self> {
        tracing::debug!(?config, "portal configuration");
        let client = PortalClient::new(config).context("building portal client")?;
        Ok(Self { client, json })
    }

    /// Load configuration from the environment, with an optional base URL
    /// override from the command line.
    pub fn from_env(base_url: Option<&str>, json: bool) -> Result<Self> {
        let mut config = PortalApiConfig::from_env().context("loading portal configuration")?;
        if let Some(url) = base_url {
            config = config.with_base_url(url).context("invalid --base-url")?;
        }
        Self::new(config, json)
    }

    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    /// Whether output is JSON instead of text tables.
    pub fn json(&self) -> bool {
        self.json
    }

    /// A controller bound to one API Definition.
    pub fn controller(&self, api_definition_id: &str) -> Result<PublishController<PortalClient>> {
        let id = ApiDefinitionId::new(api_definition_id)
            .with_context(|| format!("invalid API definition id {api_definition_id:?}"))?;
        Ok(PublishController::new(self.client.clone(), id))
    }
}

/// Print notices to stderr. Returns 1 if any of them is an error.
pub fn report_notices(notices: &[Notice]) -> u8 {
    let mut code = 0;
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => eprintln!("OK: {}", notice.message),
            NoticeLevel::Warning => eprintln!("WARNING: {}", notice.message),
            NoticeLevel::Error => {
                eprintln!("ERROR: {}", notice.message);
                code = 1;
            }
        }
    }
    code
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serializing output")?);
    Ok(())
}
