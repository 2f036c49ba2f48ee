//! # Publish Configuration
//!
//! `PublishConfig` is the desired-state payload an operator submits:
//! target gateway, mount path, bind domains and a free-text note.
//! `PublishForm` is the raw, unvalidated operator input it is parsed from.
//!
//! ## Form Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `gatewayId` | required |
//! | `basePath` | absent → `/`; blank → error; must start with `/` |
//! | `domains` | comma separated, trimmed, blanks dropped, first occurrence kept |
//! | `comment` | trimmed, blank → none |
//!
//! Every failing field is reported at once so the form can mark all of
//! them inline; submission is blocked while any error remains.

use std::fmt;

use apx_core::GatewayId;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::gateway::GatewayDirectory;

/// Mount path used when the operator does not supply one.
pub const DEFAULT_BASE_PATH: &str = "/";

/// The configuration applied when publishing to a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    pub gateway_id: GatewayId,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default, deserialize_with = "deserialize_domains")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl PublishConfig {
    /// Check the target gateway against the directory fetched at
    /// submission time.
    pub fn validate_gateway(&self, directory: &GatewayDirectory) -> Result<(), ConfigError> {
        if directory.contains(&self.gateway_id) {
            Ok(())
        } else {
            Err(ConfigError::UnknownGateway(self.gateway_id.clone()))
        }
    }

    /// Build the request body for a publish call.
    pub fn into_request(self) -> PublishRequest {
        PublishRequest {
            gateway_id: self.gateway_id.clone(),
            comment: self.comment.clone(),
            publish_config: self,
        }
    }
}

/// Body of the publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub gateway_id: GatewayId,
    pub publish_config: PublishConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Raw operator input for a publish submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishForm {
    pub gateway_id: Option<String>,
    pub base_path: Option<String>,
    pub domains: Option<String>,
    pub comment: Option<String>,
}

impl PublishForm {
    /// Validate the form and produce a [`PublishConfig`].
    pub fn parse(&self) -> Result<PublishConfig, FormErrors> {
        let mut errors = Vec::new();

        let gateway_id = match self.gateway_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => GatewayId::new(raw).ok(),
            _ => None,
        };
        if gateway_id.is_none() {
            errors.push(FieldError::new(FormField::GatewayId, "a gateway must be selected"));
        }

        let base_path = match self.base_path.as_deref().map(str::trim) {
            None => Some(DEFAULT_BASE_PATH.to_string()),
            Some("") => {
                errors.push(FieldError::new(FormField::BasePath, "base path is required"));
                None
            }
            Some(path) if !path.starts_with('/') => {
                errors.push(FieldError::new(
                    FormField::BasePath,
                    format!("base path must start with '/', got {path:?}"),
                ));
                None
            }
            Some(path) => Some(path.to_string()),
        };

        let domains = self.domains.as_deref().map(parse_domains).unwrap_or_default();

        let comment = self
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        match (gateway_id, base_path) {
            (Some(gateway_id), Some(base_path)) if errors.is_empty() => Ok(PublishConfig {
                gateway_id,
                base_path,
                domains,
                comment,
            }),
            _ => Err(FormErrors(errors)),
        }
    }
}

/// Split a free-text comma list into domains.
pub fn parse_domains(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for domain in raw.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if !out.iter().any(|d| d == domain) {
            out.push(domain.to_string());
        }
    }
    out
}

/// Domains arrive either as a JSON array or as a comma-separated string.
fn deserialize_domains<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDomains {
        List(Vec<String>),
        Text(String),
        Missing(()),
    }

    Ok(match RawDomains::deserialize(deserializer)? {
        RawDomains::List(list) => parse_domains(&list.join(",")),
        RawDomains::Text(text) => parse_domains(&text),
        RawDomains::Missing(()) => Vec::new(),
    })
}

/// Form fields that can carry an inline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    GatewayId,
    BasePath,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GatewayId => f.write_str("gatewayId"),
            Self::BasePath => f.write_str("basePath"),
        }
    }
}

/// One inline validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All validation failures of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("publish form is invalid: {}", summary(.0))]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    /// The error for `field`, if any.
    pub fn for_field(&self, field: FormField) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Submission-time configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The gateway is not in the directory retrieved at submission time.
    #[error("gateway {0} is not available in the gateway directory")]
    UnknownGateway(GatewayId),
}
