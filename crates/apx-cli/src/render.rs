//! Plain-text rendering of gateways, records, history, and diffs.
//!
//! Every function returns a `String` so output can be tested without
//! capturing stdout.

use std::fmt::Write as _;

use apx_core::{Page, Timestamp};
use apx_publish::{
    truncate_message, Gateway, PublishDecision, PublishHistoryEntry, PublishRecord, SnapshotDiff,
    DETAIL_PREVIEW_CHARS, TABLE_PREVIEW_CHARS,
};

const MISSING: &str = "-";

fn time(ts: Option<&Timestamp>) -> String {
    ts.map_or_else(|| MISSING.to_string(), Timestamp::to_rfc3339)
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn gateway_table(gateways: &[Gateway]) -> String {
    if gateways.is_empty() {
        return "No gateways available.\n".to_string();
    }
    let mut out = format!("{:<24} {:<16} {}\n", "GATEWAY ID", "TYPE", "NAME");
    for gw in gateways {
        let _ = writeln!(out, "{:<24} {:<16} {}", gw.gateway_id, gw.gateway_type, gw.gateway_name);
    }
    out
}

pub fn record_table(records: &[PublishRecord]) -> String {
    if records.is_empty() {
        return "No publish records.\n".to_string();
    }
    let mut out = format!(
        "{:<24} {:<24} {:<10} {:<26} {}\n",
        "RECORD ID", "GATEWAY", "STATUS", "PUBLISHED AT", "ENDPOINT"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<24} {:<24} {:<10} {:<26} {}",
            record.record_id,
            record.gateway_label(),
            record.status,
            time(record.published_at.as_ref()),
            record.access_endpoint.as_deref().unwrap_or(MISSING),
        );
        if let Some(message) = record.error_message.as_deref().filter(|m| !m.is_empty()) {
            let _ = writeln!(out, "  error: {}", truncate_message(message, TABLE_PREVIEW_CHARS).preview);
        }
    }
    out
}

/// One line per entry; `+` marks entries with expandable detail.
pub fn history_table(page: &Page<PublishHistoryEntry>) -> String {
    if page.items.is_empty() {
        return "No publish history.\n".to_string();
    }
    let mut out = format!(
        "  {:<24} {:<26} {:<10} {:<13} {:<16} {}\n",
        "ENTRY ID", "TIME", "ACTION", "STATUS", "OPERATOR", "MESSAGE"
    );
    for entry in &page.items {
        let marker = if entry.is_expandable() { '+' } else { ' ' };
        let message = entry
            .error_message
            .as_deref()
            .map(|m| truncate_message(m, TABLE_PREVIEW_CHARS).preview)
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{marker} {:<24} {:<26} {:<10} {:<13} {:<16} {}",
            entry.record_id,
            time(entry.created_at.as_ref()),
            entry.action,
            entry.status,
            entry.operator.as_deref().unwrap_or(MISSING),
            message,
        );
    }
    let _ = writeln!(
        out,
        "page {} of {} ({} entries)",
        page.request.page(),
        page.total_pages().max(1),
        page.total
    );
    out
}

/// The expanded view of one history entry. Error text is shown in full
/// when `full` is set, otherwise cut at the detail preview length.
pub fn entry_detail(entry: &PublishHistoryEntry, full: bool) -> String {
    let detail = entry.detail();
    let mut out = format!("Entry {}\n", detail.record_id);
    if !detail.has_content() {
        out.push_str("  (no detail recorded)\n");
        return out;
    }
    if let Some(operator) = detail.operator {
        let _ = writeln!(out, "  operator: {operator}");
    }
    if let Some(message) = detail.error_message {
        let preview = truncate_message(message, DETAIL_PREVIEW_CHARS);
        let text = if full { preview.full } else { preview.preview.as_str() };
        let _ = writeln!(out, "  error: {text}");
        if preview.truncated && !full {
            out.push_str("  (message truncated; pass --full to show all of it)\n");
        }
    }
    if let Some(config) = detail.publish_config {
        let _ = writeln!(out, "  publish config:\n{}", indent(&pretty(config)));
    }
    if let Some(config) = detail.gateway_resource_config {
        let _ = writeln!(out, "  gateway resource config:\n{}", indent(&pretty(config)));
    }
    out
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("    {l}")).collect::<Vec<_>>().join("\n")
}

pub fn decision_line(decision: &PublishDecision) -> String {
    match decision {
        PublishDecision::Allowed => "Publish: allowed".to_string(),
        PublishDecision::Blocked { message, .. } => format!("Publish: blocked ({message})"),
    }
}

pub fn diff_report(diff: &SnapshotDiff) -> String {
    if !diff.has_changes() {
        return "No differences from the latest active configuration.\n".to_string();
    }
    let stats = diff.stats();
    format!("{}{} insertions(+), {} deletions(-)\n", diff.unified(), stats.inserted, stats.deleted)
}
