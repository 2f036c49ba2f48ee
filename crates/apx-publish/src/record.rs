//! # Publish Record Lifecycle
//!
//! A publish record is the server-tracked binding of one API Definition to
//! one gateway. The backend owns the record; the client reads it and
//! requests transitions.
//!
//! ## States
//!
//! ```text
//!            publish ok                unpublish ok
//!   None ──────────────▶ Active ─────────────────────▶ Inactive
//!     │                   ▲  │ unpublish failed            │
//!     │ publish failed    │  └──────▶ Active (unchanged)   │ publish ok / failed
//!     ▼                   │                                 ▼
//!   Failed ───────────────┘◀──────────────────────── Active | Failed
//!          publish ok (retry)
//! ```
//!
//! `Unconfirmed` is an extra state for a record whose status the backend
//! did not report. Nothing may be triggered against it; only a re-fetch
//! that yields a confirmed status moves it.

use std::fmt;

use apx_core::{ApiDefinitionId, GatewayId, PublishRecordId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::PublishConfig;
use crate::gateway::GatewayType;

// ─── Record status ───────────────────────────────────────────────────

/// Resolved status of a publish record, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Active,
    Inactive,
    Failed,
    /// Status missing or not recognised. Never inferred as success.
    #[serde(other)]
    Unknown,
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

fn status_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordStatus, D::Error> {
    Ok(Option::<RecordStatus>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Record ──────────────────────────────────────────────────────────

/// A publish record as returned by the backend.
///
/// Every field beyond the identity pair defaults when absent, so schema
/// drift in the backend degrades display rather than failing the read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRecord {
    pub record_id: PublishRecordId,
    pub api_definition_id: ApiDefinitionId,
    pub gateway_id: GatewayId,
    #[serde(default)]
    pub gateway_name: Option<String>,
    #[serde(default)]
    pub gateway_type: Option<GatewayType>,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub status: RecordStatus,
    /// The configuration last applied. Kept as raw JSON because some
    /// backends store it as an encoded string; see [`PublishRecord::config`].
    #[serde(default)]
    pub publish_config: Option<serde_json::Value>,
    #[serde(default)]
    pub gateway_resource_id: Option<String>,
    #[serde(default)]
    pub access_endpoint: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub published_at: Option<Timestamp>,
    #[serde(default)]
    pub last_sync_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl PublishRecord {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Decode the applied configuration, accepting either a JSON object or
    /// a JSON string containing one.
    pub fn config(&self) -> Option<PublishConfig> {
        match self.publish_config.as_ref()? {
            serde_json::Value::String(encoded) => serde_json::from_str(encoded).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }

    /// Display name of the gateway, falling back to its id.
    pub fn gateway_label(&self) -> &str {
        self.gateway_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.gateway_id.as_str())
    }

    /// Field combinations that contradict the status.
    ///
    /// These are display-only anomalies: the record is still shown.
    pub fn consistency_issues(&self) -> Vec<RecordIssue> {
        let mut issues = Vec::new();
        if self.status != RecordStatus::Active && self.access_endpoint.is_some() {
            issues.push(RecordIssue::EndpointWithoutActive);
        }
        if self.status != RecordStatus::Failed && self.error_message.is_some() {
            issues.push(RecordIssue::ErrorWithoutFailure);
        }
        if self.status == RecordStatus::Failed && self.error_message.is_none() {
            issues.push(RecordIssue::FailureWithoutError);
        }
        if self.status == RecordStatus::Unknown {
            issues.push(RecordIssue::UnconfirmedStatus);
        }
        issues
    }
}

/// A contradiction between a record's status and its other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIssue {
    EndpointWithoutActive,
    ErrorWithoutFailure,
    FailureWithoutError,
    UnconfirmedStatus,
}

// ─── Binding state machine ───────────────────────────────────────────

/// Lifecycle state of one (API Definition, gateway) binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindingState {
    /// No record exists yet.
    None,
    Active,
    Inactive,
    Failed,
    /// A record exists but its status was not reported.
    Unconfirmed,
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Failed => "FAILED",
            Self::Unconfirmed => "UNCONFIRMED",
        };
        f.write_str(s)
    }
}

impl From<RecordStatus> for BindingState {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Active => Self::Active,
            RecordStatus::Inactive => Self::Inactive,
            RecordStatus::Failed => Self::Failed,
            RecordStatus::Unknown => Self::Unconfirmed,
        }
    }
}

/// Outcome of a publish or unpublish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingEvent {
    PublishSucceeded,
    PublishFailed { error: String },
    UnpublishSucceeded,
    UnpublishFailed { error: String },
}

impl BindingEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::PublishSucceeded => "publish succeeded",
            Self::PublishFailed { .. } => "publish failed",
            Self::UnpublishSucceeded => "unpublish succeeded",
            Self::UnpublishFailed { .. } => "unpublish failed",
        }
    }
}

/// Rejected binding transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid publish transition: {event} from {from}")]
    InvalidTransition { from: BindingState, event: &'static str },
}

impl BindingState {
    /// State of the binding for `gateway` given the fetched records.
    ///
    /// When several records exist for the same gateway the most recently
    /// created one wins.
    pub fn of(records: &[PublishRecord], gateway: &GatewayId) -> Self {
        records
            .iter()
            .filter(|r| &r.gateway_id == gateway)
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
            .map(|r| r.status.into())
            .unwrap_or(Self::None)
    }

    /// Whether a publish may be requested from this state.
    pub fn can_publish(self) -> bool {
        matches!(self, Self::None | Self::Inactive | Self::Failed)
    }

    /// Whether an unpublish may be requested from this state.
    pub fn can_unpublish(self) -> bool {
        self == Self::Active
    }

    /// Apply a call outcome.
    pub fn apply(self, event: &BindingEvent) -> Result<Self, TransitionError> {
        let next = match (self, event) {
            (s, BindingEvent::PublishSucceeded) if s.can_publish() => Self::Active,
            (s, BindingEvent::PublishFailed { .. }) if s.can_publish() => Self::Failed,
            (Self::Active, BindingEvent::UnpublishSucceeded) => Self::Inactive,
            (Self::Active, BindingEvent::UnpublishFailed { .. }) => Self::Active,
            (from, event) => {
                return Err(TransitionError::InvalidTransition {
                    from,
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

// ─── Binding with transition log ─────────────────────────────────────

/// Record of one binding transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingTransition {
    pub from: BindingState,
    pub to: BindingState,
    pub at: Timestamp,
    pub note: Option<String>,
}

/// One (API Definition, gateway) binding with its ordered transition log.
///
/// Whoever owns authoritative state drives this: it refuses illegal
/// transitions and keeps the last error message while `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishBinding {
    pub api_definition_id: ApiDefinitionId,
    pub gateway_id: GatewayId,
    state: BindingState,
    error_message: Option<String>,
    transitions: Vec<BindingTransition>,
}

impl PublishBinding {
    /// A binding with no record yet.
    pub fn new(api_definition_id: ApiDefinitionId, gateway_id: GatewayId) -> Self {
        Self {
            api_definition_id,
            gateway_id,
            state: BindingState::None,
            error_message: None,
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn transitions(&self) -> &[BindingTransition] {
        &self.transitions
    }

    /// Apply `event`, appending to the transition log.
    pub fn apply(&mut self, event: BindingEvent) -> Result<BindingState, TransitionError> {
        let next = self.state.apply(&event)?;
        let note = match event {
            BindingEvent::PublishFailed { error } => {
                self.error_message = Some(error.clone());
                Some(error)
            }
            BindingEvent::UnpublishFailed { error } => Some(error),
            BindingEvent::PublishSucceeded | BindingEvent::UnpublishSucceeded => {
                self.error_message = None;
                None
            }
        };
        tracing::info!(
            api_definition_id = %self.api_definition_id,
            gateway_id = %self.gateway_id,
            from = %self.state,
            to = %next,
            "publish binding transition"
        );
        self.transitions.push(BindingTransition {
            from: self.state,
            to: next,
            at: Timestamp::now(),
            note,
        });
        self.state = next;
        Ok(next)
    }
}
