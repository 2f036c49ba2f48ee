//! # Publish History
//!
//! Every publish, unpublish and update against an API Definition leaves
//! one immutable log line. The log is append-only and displayed newest
//! first. Entries carry the configuration that was applied so any of them
//! can be diffed against the latest active snapshot.
//!
//! History statuses are a different vocabulary from record statuses:
//! `PUBLISHING` and `UNPUBLISHING` describe an action still in flight.

use std::cmp::Ordering;
use std::fmt;

use apx_core::{ApiDefinitionId, GatewayId, HistoryEntryId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error-message preview length in list rows.
pub const TABLE_PREVIEW_CHARS: usize = 50;

/// Error-message preview length in expanded detail panes.
pub const DETAIL_PREVIEW_CHARS: usize = 200;

// ─── Vocabulary ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishAction {
    Publish,
    Unpublish,
    Update,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Publish => "PUBLISH",
            Self::Unpublish => "UNPUBLISH",
            Self::Update => "UPDATE",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Status of the action recorded by a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryStatus {
    Publishing,
    Unpublishing,
    Active,
    Inactive,
    Failed,
    /// Literal success marker some backends write for completed actions.
    Success,
    /// Missing or unrecognised. Never read as success.
    #[serde(other)]
    Unknown,
}

impl Default for HistoryStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl HistoryStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Publishing | Self::Unpublishing)
    }

    /// Whether the action completed successfully.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Active | Self::Success)
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Publishing => "PUBLISHING",
            Self::Unpublishing => "UNPUBLISHING",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Failed => "FAILED",
            Self::Success => "SUCCESS",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

fn status_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HistoryStatus, D::Error> {
    Ok(Option::<HistoryStatus>::deserialize(deserializer)?.unwrap_or_default())
}

fn action_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PublishAction, D::Error> {
    Ok(Option::<PublishAction>::deserialize(deserializer)?.unwrap_or(PublishAction::Unknown))
}

// ─── Entry ───────────────────────────────────────────────────────────

/// One publish history log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishHistoryEntry {
    pub record_id: HistoryEntryId,
    pub api_definition_id: ApiDefinitionId,
    #[serde(default)]
    pub gateway_id: Option<GatewayId>,
    #[serde(default, deserialize_with = "action_or_unknown")]
    pub action: PublishAction,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub status: HistoryStatus,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub snapshot: Option<Value>,
    #[serde(default)]
    pub publish_config: Option<Value>,
    #[serde(default)]
    pub gateway_resource_config: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub publish_note: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Default for PublishAction {
    fn default() -> Self {
        Self::Unknown
    }
}

impl PublishHistoryEntry {
    /// The configuration captured by this entry: `snapshot` when present,
    /// otherwise `publishConfig`.
    pub fn config_snapshot(&self) -> Option<&Value> {
        present(self.snapshot.as_ref()).or_else(|| present(self.publish_config.as_ref()))
    }

    /// Whether this entry is a completed, successful publish.
    pub fn is_successful_publish(&self) -> bool {
        self.action == PublishAction::Publish && self.status.is_success()
    }

    /// Fields shown when the row is expanded.
    pub fn detail(&self) -> EntryDetail<'_> {
        EntryDetail {
            record_id: &self.record_id,
            operator: self.operator.as_deref().filter(|o| !o.is_empty()),
            error_message: self.error_message.as_deref().filter(|m| !m.is_empty()),
            publish_config: present(self.publish_config.as_ref()),
            gateway_resource_config: present(self.gateway_resource_config.as_ref()),
        }
    }

    /// Whether the row has anything to expand.
    pub fn is_expandable(&self) -> bool {
        self.detail().has_content()
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Expanded-row detail of a history entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryDetail<'a> {
    pub record_id: &'a HistoryEntryId,
    pub operator: Option<&'a str>,
    pub error_message: Option<&'a str>,
    pub publish_config: Option<&'a Value>,
    pub gateway_resource_config: Option<&'a Value>,
}

impl EntryDetail<'_> {
    /// Whether any of operator, error message, publish config or gateway
    /// resource config is present.
    pub fn has_content(&self) -> bool {
        self.operator.is_some()
            || self.error_message.is_some()
            || self.publish_config.is_some()
            || self.gateway_resource_config.is_some()
    }
}

// ─── Log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history entry {0} already exists; entries are immutable")]
    DuplicateEntry(HistoryEntryId),
}

/// Append-only publish history, newest first.
///
/// Entries without a timestamp sort after dated ones; equal timestamps are
/// ordered by entry id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishHistory {
    entries: Vec<PublishHistoryEntry>,
}

impl PublishHistory {
    /// Build from fetched entries.
    pub fn from_entries(mut entries: Vec<PublishHistoryEntry>) -> Self {
        entries.sort_by(display_order);
        Self { entries }
    }

    /// Append a new entry at its display position.
    pub fn append(&mut self, entry: PublishHistoryEntry) -> Result<(), HistoryError> {
        if self.get(&entry.record_id).is_some() {
            return Err(HistoryError::DuplicateEntry(entry.record_id));
        }
        let at = self
            .entries
            .iter()
            .position(|existing| display_order(&entry, existing) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
        Ok(())
    }

    pub fn entries(&self) -> &[PublishHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &HistoryEntryId) -> Option<&PublishHistoryEntry> {
        self.entries.iter().find(|e| &e.record_id == id)
    }

    /// Snapshot of the most recent successful publish.
    pub fn latest_active_snapshot(&self) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.is_successful_publish())
            .and_then(PublishHistoryEntry::config_snapshot)
    }
}

/// Newest first; undated last.
fn display_order(a: &PublishHistoryEntry, b: &PublishHistoryEntry) -> Ordering {
    match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.record_id.cmp(&b.record_id))
}

// ─── Message previews ────────────────────────────────────────────────

/// A possibly-truncated error message. The full text is always kept so
/// the view can expand it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePreview<'a> {
    pub preview: String,
    pub full: &'a str,
    pub truncated: bool,
}

/// Cut `message` to at most `limit` characters, appending `…` when cut.
pub fn truncate_message(message: &str, limit: usize) -> MessagePreview<'_> {
    match message.char_indices().nth(limit) {
        None => MessagePreview {
            preview: message.to_string(),
            full: message,
            truncated: false,
        },
        Some((cut, _)) => MessagePreview {
            preview: format!("{}…", &message[..cut]),
            full: message,
            truncated: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, action: &str, status: Option<&str>, created: Option<&str>) -> PublishHistoryEntry {
        let mut v = json!({
            "recordId": id,
            "apiDefinitionId": "api-1",
            "gatewayId": "gw-1",
            "action": action,
        });
        if let Some(s) = status {
            v["status"] = json!(s);
        }
        if let Some(ts) = created {
            v["createdAt"] = json!(ts);
        }
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn entries_sorted_newest_first_with_undated_last() {
        let history = PublishHistory::from_entries(vec![
            entry("old", "PUBLISH", Some("ACTIVE"), Some("2026-01-01T00:00:00Z")),
            entry("undated", "UPDATE", Some("ACTIVE"), None),
            entry("new", "UNPUBLISH", Some("INACTIVE"), Some("2026-02-01T00:00:00Z")),
        ]);
        let ids: Vec<&str> = history.entries().iter().map(|e| e.record_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[test]
    fn append_inserts_in_display_order_and_rejects_duplicates() {
        let mut history = PublishHistory::from_entries(vec![entry(
            "h1",
            "PUBLISH",
            Some("ACTIVE"),
            Some("2026-01-01T00:00:00Z"),
        )]);
        history
            .append(entry("h2", "UNPUBLISH", Some("INACTIVE"), Some("2026-01-02T00:00:00Z")))
            .unwrap();
        assert_eq!(history.entries()[0].record_id.as_str(), "h2");

        let dup = entry("h1", "PUBLISH", Some("FAILED"), None);
        assert!(matches!(history.append(dup), Err(HistoryError::DuplicateEntry(_))));
        assert_eq!(history.get(&HistoryEntryId::new("h1").unwrap()).unwrap().status, HistoryStatus::Active);
    }

    #[test]
    fn missing_status_is_unknown_and_not_success() {
        let e = entry("h1", "PUBLISH", None, None);
        assert_eq!(e.status, HistoryStatus::Unknown);
        assert!(!e.is_successful_publish());
    }

    #[test]
    fn unknown_action_tolerated() {
        let e = entry("h1", "ROLLBACK", Some("ACTIVE"), None);
        assert_eq!(e.action, PublishAction::Unknown);
    }

    #[test]
    fn in_flight_statuses() {
        assert!(HistoryStatus::Publishing.is_in_flight());
        assert!(HistoryStatus::Unpublishing.is_in_flight());
        assert!(!HistoryStatus::Active.is_in_flight());
    }

    #[test]
    fn snapshot_preferred_over_publish_config() {
        let mut e = entry("h1", "PUBLISH", Some("ACTIVE"), None);
        e.publish_config = Some(json!({"basePath": "/cfg"}));
        assert_eq!(e.config_snapshot(), Some(&json!({"basePath": "/cfg"})));
        e.snapshot = Some(json!({"basePath": "/snap"}));
        assert_eq!(e.config_snapshot(), Some(&json!({"basePath": "/snap"})));
    }

    #[test]
    fn latest_active_snapshot_skips_failed_and_unpublish() {
        let mut good = entry("h1", "PUBLISH", Some("ACTIVE"), Some("2026-01-01T00:00:00Z"));
        good.snapshot = Some(json!({"basePath": "/v1"}));
        let mut failed = entry("h2", "PUBLISH", Some("FAILED"), Some("2026-01-03T00:00:00Z"));
        failed.snapshot = Some(json!({"basePath": "/broken"}));
        let unpublish = entry("h3", "UNPUBLISH", Some("INACTIVE"), Some("2026-01-04T00:00:00Z"));

        let history = PublishHistory::from_entries(vec![good, failed, unpublish]);
        assert_eq!(history.latest_active_snapshot(), Some(&json!({"basePath": "/v1"})));
    }

    #[test]
    fn success_literal_counts_as_success() {
        let mut e = entry("h1", "PUBLISH", Some("SUCCESS"), None);
        e.publish_config = Some(json!({"basePath": "/ok"}));
        let history = PublishHistory::from_entries(vec![e]);
        assert!(history.latest_active_snapshot().is_some());
    }

    #[test]
    fn expandable_only_with_detail_fields() {
        let bare = entry("h1", "PUBLISH", Some("ACTIVE"), None);
        assert!(!bare.is_expandable());

        let mut with_operator = bare.clone();
        with_operator.operator = Some("alice".into());
        assert!(with_operator.is_expandable());

        let mut with_resource = bare.clone();
        with_resource.gateway_resource_config = Some(json!({"routeId": "r-1"}));
        assert!(with_resource.is_expandable());

        let mut with_null = bare;
        with_null.publish_config = Some(Value::Null);
        assert!(!with_null.is_expandable());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let short = truncate_message("boom", TABLE_PREVIEW_CHARS);
        assert!(!short.truncated);
        assert_eq!(short.preview, "boom");

        let long = "网关超时".repeat(20);
        let preview = truncate_message(&long, TABLE_PREVIEW_CHARS);
        assert!(preview.truncated);
        assert_eq!(preview.preview.chars().count(), TABLE_PREVIEW_CHARS + 1);
        assert_eq!(preview.full, long);
    }

    #[test]
    fn exact_limit_is_not_truncated() {
        let msg = "x".repeat(DETAIL_PREVIEW_CHARS);
        assert!(!truncate_message(&msg, DETAIL_PREVIEW_CHARS).truncated);
    }
}
