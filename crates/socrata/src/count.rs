//! Row-count estimator: a `count(*)` query that honours `$where` and `$q`.

use crate::client::SocrataApi;
use crate::error::Result;
use crate::rows::{fetch_rows, Row};
use crate::soql::{RowFilter, SoqlParams};
use serde_json::Value;

/// Counts the rows matching `filter`.
///
/// Only `where` and the full-text query shape the count; projection,
/// ordering and grouping clauses are left off. A missing or unparseable
/// count reads as zero. Fetch errors propagate unchanged.
pub async fn count_rows(
    api: &dyn SocrataApi,
    base_url: &str,
    dataset_id: &str,
    filter: &RowFilter,
) -> Result<u64> {
    let params = SoqlParams::new()
        .set("$select", "count(*)")
        .set_opt("$where", filter.where_clause.as_deref())
        .set_opt("$q", filter.full_text_query.as_deref())
        .limit(1);
    let rows = fetch_rows(api, base_url, dataset_id, &params).await?;
    let total = rows.first().map(parse_count).unwrap_or(0);
    tracing::debug!(target: "opengov::pagination", dataset_id, total, "counted rows");
    Ok(total)
}

fn parse_count(row: &Row) -> u64 {
    let field = row.get("count").or_else(|| {
        row.iter()
            .find(|(key, _)| key.starts_with("count"))
            .map(|(_, v)| v)
    });
    match field {
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}
