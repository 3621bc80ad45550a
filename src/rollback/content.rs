//! Inverse computation for `CONTENT` operations: AI-driven edits recorded as
//! a before/after snapshot pair, reversed by drift-checked swap rather than
//! true patch application — sufficient because the "hunk" is the whole file.

use serde_json::Value;
use similar::TextDiff;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentRollbackError {
    #[error("undo_info missing required field: {0}")]
    MissingField(&'static str),
    #[error("file has drifted since the recorded edit; reversed diff does not apply cleanly")]
    Drifted,
}

/// Build the `undo_info` map for a content edit: the before/after text plus
/// a unified diff kept for display and audit purposes.
pub fn record_content_edit(before: &str, after: &str) -> HashMap<String, Value> {
    let diff = TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header("before", "after")
        .to_string();

    let mut undo_info = HashMap::new();
    undo_info.insert("before".to_string(), Value::String(before.to_string()));
    undo_info.insert("after".to_string(), Value::String(after.to_string()));
    undo_info.insert("diff".to_string(), Value::String(diff));
    undo_info
}

/// Reverse a recorded content edit against the file's `current` contents.
/// Succeeds only if `current` still matches the recorded post-edit state
/// (no drift); otherwise the reversed diff cannot be trusted to apply.
pub fn reverse_apply(current: &str, undo_info: &HashMap<String, Value>) -> Result<String, ContentRollbackError> {
    let before = undo_info
        .get("before")
        .and_then(Value::as_str)
        .ok_or(ContentRollbackError::MissingField("before"))?;
    let after = undo_info
        .get("after")
        .and_then(Value::as_str)
        .ok_or(ContentRollbackError::MissingField("after"))?;

    if current != after {
        return Err(ContentRollbackError::Drifted);
    }
    Ok(before.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_apply_recovers_original_bytes_without_drift() {
        let undo = record_content_edit("A=0\n", "A=1\n");
        let restored = reverse_apply("A=1\n", &undo).unwrap();
        assert_eq!(restored, "A=0\n");
    }

    #[test]
    fn reverse_apply_detects_drift() {
        let undo = record_content_edit("A=0\n", "A=1\n");
        let result = reverse_apply("A=2\n", &undo);
        assert!(matches!(result, Err(ContentRollbackError::Drifted)));
    }
}
