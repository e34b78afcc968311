//! Coercion of untrusted extractor output into the task schema's value
//! domains.
//!
//! Pure functions, no I/O. Every rule applies per task — one malformed
//! element never fails the batch, and an empty batch is a valid result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Priority;

use super::RawTask;

/// Title used when the model returned none.
pub const UNTITLED_TASK: &str = "Untitled task";

/// A task that has passed sanitization and may be persisted.
///
/// Field names serialize to the same camelCase contract the extraction
/// prompt specifies, so a sanitized task re-sanitizes to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTask {
    /// Action-oriented title, never empty.
    pub title: String,
    /// Context from the original text, possibly empty.
    pub description: String,
    /// Always set; anything outside low/medium/high became medium.
    pub priority: Priority,
    /// Assignee, only when the model named a non-empty one.
    pub assignee: Option<String>,
    /// Due date string as the model returned it. Presence only — parseability
    /// is enforced by the store on insert.
    pub due_date: Option<String>,
    /// Tags, empty when the model returned anything but a list.
    pub tags: Vec<String>,
}

/// Sanitize a batch of raw tasks, preserving order.
pub fn sanitize(raw: &[RawTask]) -> Vec<ExtractedTask> {
    raw.iter().map(sanitize_one).collect()
}

fn sanitize_one(raw: &RawTask) -> ExtractedTask {
    let value = &raw.0;

    let title = match value.get("title").and_then(Value::as_str) {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => UNTITLED_TASK.to_owned(),
    };

    let description = value
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    // Case-sensitive match against the enumerated set; everything else,
    // including "urgent" or "HIGH", falls back to medium.
    let priority = value
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|p| Priority::parse(p).ok())
        .unwrap_or_default();

    let assignee = value
        .get("assignee")
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty())
        .map(str::to_owned);

    let due_date = value
        .get("dueDate")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(str::to_owned);

    let tags = match value.get("tags").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        None => Vec::new(),
    };

    ExtractedTask {
        title,
        description,
        priority,
        assignee,
        due_date,
        tags,
    }
}
