//! Best-effort shrinking of rows over the per-row byte budget.

use crate::error::Result;
use crate::rows::{serialized_len, Row};
use serde_json::Value;

pub const MAX_FIELD_CHARS: usize = 1000;
pub const MAX_ARRAY_ITEMS: usize = 10;
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Passes `row` through when its serialized size is within `max_bytes`,
/// otherwise returns a shortened copy flagged with `_truncated`.
///
/// Long strings are cut to [`MAX_FIELD_CHARS`] characters and long arrays
/// to [`MAX_ARRAY_ITEMS`] items (with a `<field>_truncated` sibling). The
/// result is not guaranteed to fit the budget.
pub fn enforce_row_size(row: Row, max_bytes: usize) -> Result<Row> {
    let size = serialized_len(&row)?;
    if size <= max_bytes {
        return Ok(row);
    }
    tracing::debug!(target: "opengov::documents", size, max_bytes, "truncating oversized row");
    Ok(truncate_row(row))
}

fn truncate_row(row: Row) -> Row {
    let mut out = Row::new();
    for (field, value) in row {
        match value {
            Value::String(text) if text.chars().count() > MAX_FIELD_CHARS => {
                let mut cut: String = text.chars().take(MAX_FIELD_CHARS).collect();
                cut.push_str(TRUNCATION_MARKER);
                out.insert(field, Value::String(cut));
            }
            Value::Array(mut items) if items.len() > MAX_ARRAY_ITEMS => {
                items.truncate(MAX_ARRAY_ITEMS);
                let flag = format!("{field}_truncated");
                out.insert(field, Value::Array(items));
                out.insert(flag, Value::Bool(true));
            }
            other => {
                out.insert(field, other);
            }
        }
    }
    out.insert("_truncated".to_string(), Value::Bool(true));
    out
}
