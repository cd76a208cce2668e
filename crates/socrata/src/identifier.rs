//! Row identity: which column names a row, and synthetic positional ids.

use crate::client::SocrataApi;
use crate::rows::{fetch_rows, Row};
use crate::soql::SoqlParams;
use serde_json::Value;

/// Candidate identifier columns, highest priority first.
pub const IDENTIFIER_CANDIDATES: [&str; 6] = [":id", "_id", "id", "ID", "uid", "UID"];

/// Socrata's system row id, used when nothing better is found.
pub const DEFAULT_IDENTIFIER_FIELD: &str = ":id";

const POSITIONAL_PREFIX: &str = "row_";

/// First candidate column present in `row`.
pub fn identifier_field(row: &Row) -> Option<&'static str> {
    IDENTIFIER_CANDIDATES
        .into_iter()
        .find(|field| row.get(*field).is_some_and(|v| !v.is_null()))
}

/// The row's identifier value rendered as text.
pub fn row_identifier(row: &Row) -> Option<String> {
    let field = identifier_field(row)?;
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Synthetic id for a row that has no identifier column: `row_<offset>`.
pub fn positional_id(offset: u64) -> String {
    format!("{POSITIONAL_PREFIX}{offset}")
}

/// Parses `row_<N>` back into its offset.
pub fn parse_positional_id(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(POSITIONAL_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Samples one row to find the dataset's identifier column.
///
/// Falls back to [`DEFAULT_IDENTIFIER_FIELD`] when the sample is empty, has
/// no candidate column, or the probe fails.
pub async fn detect_identifier_field(
    api: &dyn SocrataApi,
    base_url: &str,
    dataset_id: &str,
) -> &'static str {
    let params = SoqlParams::new().set("$select", ":*, *").limit(1);
    match fetch_rows(api, base_url, dataset_id, &params).await {
        Ok(rows) => {
            let field = rows
                .first()
                .and_then(identifier_field)
                .unwrap_or(DEFAULT_IDENTIFIER_FIELD);
            tracing::debug!(target: "opengov::documents", dataset_id, field, "identifier field");
            field
        }
        Err(e) => {
            tracing::debug!(
                target: "opengov::documents",
                dataset_id,
                error = %e,
                "identifier probe failed, using default"
            );
            DEFAULT_IDENTIFIER_FIELD
        }
    }
}
