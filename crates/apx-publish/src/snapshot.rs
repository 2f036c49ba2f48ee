//! # Snapshot Normalisation and Diffing
//!
//! A snapshot is the point-in-time configuration stored with a history
//! entry. Backends hand it over as a JSON object, as a JSON-encoded string,
//! or not at all. `normalize` turns any of those into one stable text form
//! so two snapshots can be compared line by line.
//!
//! Object keys come out sorted and indentation is two spaces, so the output
//! is deterministic, and feeding the output back in yields the same text.

use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use crate::history::{PublishHistory, PublishHistoryEntry};

/// Rendered in place of a missing snapshot.
pub const ABSENT_MARKER: &str = "—";

/// Lines of context around each hunk in a unified diff.
const CONTEXT_RADIUS: usize = 3;

/// Raw snapshot input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotInput<'a> {
    Absent,
    Text(&'a str),
    Structured(&'a Value),
}

impl<'a> From<Option<&'a Value>> for SnapshotInput<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) => Self::Text(s),
            Some(other) => Self::Structured(other),
        }
    }
}

impl<'a> From<&'a str> for SnapshotInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

/// Render a snapshot as comparable text.
///
/// - absent → [`ABSENT_MARKER`]
/// - text that parses as JSON → pretty-printed JSON
/// - text that does not parse → returned verbatim
/// - structured → pretty-printed JSON
pub fn normalize<'a>(input: impl Into<SnapshotInput<'a>>) -> String {
    match input.into() {
        SnapshotInput::Absent => ABSENT_MARKER.to_string(),
        SnapshotInput::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => pretty(&parsed),
            Err(_) => text.to_string(),
        },
        SnapshotInput::Structured(value) => pretty(value),
    }
}

fn pretty(value: &Value) -> String {
    let sorted = sort_keys(value);
    // Serializing a Value cannot fail: keys are always strings.
    serde_json::to_string_pretty(&sorted).unwrap_or_else(|_| sorted.to_string())
}

/// Rebuild objects with keys inserted in sorted order, so the output does
/// not depend on whether `serde_json` preserves insertion order.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), sort_keys(&map[k])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Two normalized snapshots ready for a side-by-side or unified view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Latest active snapshot.
    pub left: String,
    /// Snapshot being inspected.
    pub right: String,
}

/// Inserted/deleted line counts of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub inserted: usize,
    pub deleted: usize,
}

impl SnapshotDiff {
    /// Normalize both sides.
    pub fn between<'a, 'b>(
        latest_active: impl Into<SnapshotInput<'a>>,
        target: impl Into<SnapshotInput<'b>>,
    ) -> Self {
        Self {
            left: normalize(latest_active),
            right: normalize(target),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.left != self.right
    }

    /// Line-based unified diff, latest active first.
    pub fn unified(&self) -> String {
        TextDiff::from_lines(&self.left, &self.right)
            .unified_diff()
            .context_radius(CONTEXT_RADIUS)
            .header("latest-active", "selected")
            .to_string()
    }

    pub fn stats(&self) -> DiffStats {
        let diff = TextDiff::from_lines(&self.left, &self.right);
        diff.iter_all_changes()
            .fold(DiffStats::default(), |mut acc, change| {
                match change.tag() {
                    ChangeTag::Insert => acc.inserted += 1,
                    ChangeTag::Delete => acc.deleted += 1,
                    ChangeTag::Equal => {}
                }
                acc
            })
    }
}

/// Compares history entries against the latest active snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotComparator;

impl SnapshotComparator {
    /// Diff `entry` against the most recent successful publish in
    /// `history`. When no successful publish exists the left side is the
    /// absent marker.
    pub fn for_entry(history: &PublishHistory, entry: &PublishHistoryEntry) -> SnapshotDiff {
        Self::against(history.latest_active_snapshot(), entry)
    }

    /// Diff `entry` against a latest active snapshot resolved elsewhere,
    /// e.g. from a newer history page than the one holding `entry`.
    pub fn against(latest_active: Option<&Value>, entry: &PublishHistoryEntry) -> SnapshotDiff {
        SnapshotDiff::between(latest_active, entry.config_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_render_marker() {
        assert_eq!(normalize(SnapshotInput::Absent), ABSENT_MARKER);
        assert_eq!(normalize(Some(&Value::Null)), ABSENT_MARKER);
        assert_eq!(normalize(None::<&Value>), ABSENT_MARKER);
    }

    #[test]
    fn json_text_and_structured_agree() {
        let from_text = normalize(r#"{"a":1}"#);
        let obj = json!({"a": 1});
        let from_value = normalize(Some(&obj));
        assert_eq!(from_text, "{\n  \"a\": 1\n}");
        assert_eq!(from_text, from_value);
    }

    #[test]
    fn non_json_text_is_verbatim() {
        assert_eq!(normalize("basePath=/api"), "basePath=/api");
    }

    #[test]
    fn keys_are_sorted() {
        let text = normalize(r#"{"b":1,"a":{"d":2,"c":3}}"#);
        let a = text.find("\"a\"").unwrap();
        let b = text.find("\"b\"").unwrap();
        let c = text.find("\"c\"").unwrap();
        let d = text.find("\"d\"").unwrap();
        assert!(a < b && c < d);
    }

    #[test]
    fn json_string_value_is_treated_as_text() {
        let encoded = Value::String(r#"{"basePath":"/v1"}"#.to_string());
        assert_eq!(normalize(Some(&encoded)), "{\n  \"basePath\": \"/v1\"\n}");
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let a = json!({"basePath": "/v1", "domains": ["a.com"]});
        let diff = SnapshotDiff::between(Some(&a), r#"{"domains":["a.com"],"basePath":"/v1"}"#);
        assert!(!diff.has_changes());
        assert_eq!(diff.stats(), DiffStats::default());
    }

    #[test]
    fn changed_line_shows_in_unified_diff() {
        let a = json!({"basePath": "/v1"});
        let b = json!({"basePath": "/v2"});
        let diff = SnapshotDiff::between(Some(&a), Some(&b));
        assert!(diff.has_changes());
        let unified = diff.unified();
        assert!(unified.contains("-  \"basePath\": \"/v1\""));
        assert!(unified.contains("+  \"basePath\": \"/v2\""));
        assert_eq!(diff.stats(), DiffStats { inserted: 1, deleted: 1 });
    }
}
