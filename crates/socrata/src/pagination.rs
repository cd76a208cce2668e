//! Row fetching policy: whole result, bounded preview, or capped multi-page.

use crate::client::SocrataApi;
use crate::count::count_rows;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::rows::{fetch_rows, Row};
use crate::soql::{RowFilter, SoqlParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested row count: a number, or `"all"` for a capped full fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    Rows(u64),
    All,
}

impl FromStr for RowLimit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<u64>()
            .map(Self::Rows)
            .map_err(|_| {
                Error::invalid(format!(
                    "limit must be a non-negative integer or \"all\", got '{s}'"
                ))
            })
    }
}

impl fmt::Display for RowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(n) => write!(f, "{n}"),
            Self::All => f.write_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for RowLimit {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Rows(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl Serialize for RowLimit {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Rows(n) => serializer.serialize_u64(*n),
            Self::All => serializer.serialize_str("all"),
        }
    }
}

/// Rows plus the bookkeeping a caller needs to tell a full answer from a
/// preview and to resume a truncated fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub data: Vec<Row>,
    pub is_sample: bool,
    pub returned_rows: u64,
    pub total_rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

impl SearchResponse {
    fn complete(data: Vec<Row>, total_rows: u64) -> Self {
        Self {
            returned_rows: data.len() as u64,
            data,
            is_sample: false,
            total_rows,
            has_more: None,
            next_offset: None,
        }
    }
}

/// Fetches rows for `filter`, choosing between the raw-query, whole-result,
/// capped `"all"` and preview strategies.
///
/// Any fetch error aborts the whole operation.
pub async fn search(
    api: &dyn SocrataApi,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    filter: &RowFilter,
    limit: Option<RowLimit>,
    offset: u64,
) -> Result<SearchResponse> {
    if let Some(query) = filter.raw_query() {
        return raw_query(api, limits, base_url, dataset_id, query).await;
    }

    let total = count_rows(api, base_url, dataset_id, filter).await?;
    let requested = match limit {
        Some(RowLimit::All) => {
            return fetch_all(api, limits, base_url, dataset_id, filter, total, offset).await
        }
        Some(RowLimit::Rows(n)) => Some(n),
        None => None,
    };

    let max = limits.max_rows;
    if total <= max {
        let want = requested.unwrap_or(total).min(max);
        if want == 0 {
            tracing::debug!(target: "opengov::pagination", dataset_id, "nothing to fetch");
            return Ok(SearchResponse::complete(Vec::new(), total));
        }
        let params = SoqlParams::from_filter(filter).limit(want).offset(offset);
        let data = fetch_rows(api, base_url, dataset_id, &params).await?;
        tracing::debug!(
            target: "opengov::pagination",
            dataset_id,
            total,
            returned = data.len(),
            "returned whole result"
        );
        return Ok(SearchResponse::complete(data, total));
    }

    preview(api, limits, base_url, dataset_id, filter, requested, total, offset).await
}

async fn raw_query(
    api: &dyn SocrataApi,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    query: &str,
) -> Result<SearchResponse> {
    let data = fetch_rows(api, base_url, dataset_id, &SoqlParams::raw(query)).await?;
    let returned = data.len() as u64;
    tracing::debug!(target: "opengov::pagination", dataset_id, returned, "raw SoQL query");
    Ok(SearchResponse {
        data,
        is_sample: false,
        returned_rows: returned,
        total_rows: returned,
        has_more: Some(returned == limits.max_rows),
        next_offset: None,
    })
}

async fn fetch_all(
    api: &dyn SocrataApi,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    filter: &RowFilter,
    total: u64,
    offset: u64,
) -> Result<SearchResponse> {
    let cap = limits.row_fetch_cap();
    let remaining = total.saturating_sub(offset);
    let target = remaining.min(cap);

    // Pages must share one ordering or rows can repeat across batches.
    let mut base = SoqlParams::from_filter(filter);
    if !filter.has_ordering() {
        base = base.set("$order", ":id");
    }

    let mut data: Vec<Row> = Vec::new();
    let mut cursor = offset;
    while (data.len() as u64) < target {
        let batch = (target - data.len() as u64).min(limits.max_rows);
        let params = base.clone().limit(batch).offset(cursor);
        let rows = fetch_rows(api, base_url, dataset_id, &params).await?;
        if rows.is_empty() {
            tracing::debug!(target: "opengov::pagination", dataset_id, cursor, "empty batch, stopping");
            break;
        }
        cursor = cursor.saturating_add(rows.len() as u64);
        data.extend(rows);
        tracing::debug!(target: "opengov::pagination", dataset_id, fetched = data.len(), target, "fetched batch");
    }
    data.truncate(target as usize);

    let fetched = data.len() as u64;
    let has_more = remaining > cap;
    if has_more {
        tracing::info!(
            target: "opengov::pagination",
            dataset_id,
            total,
            cap,
            "row fetch cap reached"
        );
    }
    Ok(SearchResponse {
        data,
        is_sample: has_more,
        returned_rows: fetched,
        total_rows: total,
        has_more: Some(has_more),
        next_offset: has_more.then_some(offset.saturating_add(fetched)),
    })
}

#[allow(clippy::too_many_arguments)]
async fn preview(
    api: &dyn SocrataApi,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    filter: &RowFilter,
    requested: Option<u64>,
    total: u64,
    offset: u64,
) -> Result<SearchResponse> {
    let size = requested
        .unwrap_or(limits.default_preview_rows)
        .min(limits.max_rows);
    let params = SoqlParams::from_filter(filter).limit(size).offset(offset);
    let data = fetch_rows(api, base_url, dataset_id, &params).await?;
    let returned = data.len() as u64;
    let next = offset.saturating_add(returned);
    let has_more = next < total;
    tracing::debug!(target: "opengov::pagination", dataset_id, total, returned, has_more, "returned preview");
    Ok(SearchResponse {
        data,
        is_sample: true,
        returned_rows: returned,
        total_rows: total,
        has_more: Some(has_more),
        next_offset: has_more.then_some(next),
    })
}
