//! # Single-Active Publish Constraint
//!
//! The backend binds an API Definition to at most one live gateway target.
//! The client must not offer a publish action that would break this, and
//! must re-check the rule against the freshest record fetch right before
//! submitting.
//!
//! If the backend ever reports several ACTIVE records (a race, a stale
//! cache), the earliest-created one is treated as the active record and
//! the rest are surfaced as anomalies. This never fails.

use std::cmp::Ordering;

use apx_core::PublishRecordId;
use thiserror::Error;

use crate::record::PublishRecord;

/// Whether the publish action may be offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    Allowed,
    /// Disabled, with the message to show beside the disabled trigger.
    Blocked {
        record_id: PublishRecordId,
        gateway: String,
        message: String,
    },
}

impl PublishDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Precondition failure at the publish call boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("API definition is already published to {gateway} (record {record_id}); unpublish it first")]
    AlreadyActive {
        record_id: PublishRecordId,
        gateway: String,
    },
}

/// The one-active-target rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishConstraintPolicy;

impl PublishConstraintPolicy {
    /// False when any record is ACTIVE.
    pub fn can_publish(records: &[PublishRecord]) -> bool {
        !records.iter().any(PublishRecord::is_active)
    }

    /// The first ACTIVE record by `createdAt` ascending.
    ///
    /// Records without a creation time sort after those that have one;
    /// remaining ties are broken by record id.
    pub fn active_record(records: &[PublishRecord]) -> Option<&PublishRecord> {
        records.iter().filter(|r| r.is_active()).min_by(|a, b| creation_order(a, b))
    }

    /// ACTIVE records beyond the selected one. Empty under the invariant.
    pub fn anomalies(records: &[PublishRecord]) -> Vec<&PublishRecord> {
        let mut active: Vec<&PublishRecord> = records.iter().filter(|r| r.is_active()).collect();
        active.sort_by(|a, b| creation_order(a, b));
        if active.len() > 1 {
            tracing::warn!(
                api_definition_id = %active[0].api_definition_id,
                active_count = active.len(),
                "multiple ACTIVE publish records; treating the earliest as current"
            );
        }
        active.into_iter().skip(1).collect()
    }

    /// Decide whether to offer the publish action.
    pub fn decide(records: &[PublishRecord]) -> PublishDecision {
        match Self::active_record(records) {
            None => PublishDecision::Allowed,
            Some(active) => {
                let gateway = active.gateway_label().to_string();
                PublishDecision::Blocked {
                    record_id: active.record_id.clone(),
                    message: format!(
                        "Already published to {gateway}. Only one active gateway per API \
                         definition is supported; unpublish the current record before \
                         publishing again."
                    ),
                    gateway,
                }
            }
        }
    }

    /// Call-boundary precondition for a publish submission.
    pub fn ensure_can_publish(records: &[PublishRecord]) -> Result<(), PolicyError> {
        match Self::active_record(records) {
            None => Ok(()),
            Some(active) => Err(PolicyError::AlreadyActive {
                record_id: active.record_id.clone(),
                gateway: active.gateway_label().to_string(),
            }),
        }
    }
}

fn creation_order(a: &PublishRecord, b: &PublishRecord) -> Ordering {
    match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.record_id.cmp(&b.record_id))
}
