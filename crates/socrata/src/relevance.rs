//! Id search with a simple substring relevance score.

use crate::client::SocrataApi;
use crate::error::{Error, Result};
use crate::identifier::{positional_id, row_identifier};
use crate::limits::Limits;
use crate::rows::{fetch_rows, serialized_len, Row};
use crate::soql::SoqlParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Fields whose matches earn a bonus.
pub const BOOSTED_FIELDS: [&str; 3] = ["name", "title", "description"];

const EXACT_MATCH_POINTS: f64 = 10.0;
const SUBSTRING_POINTS: f64 = 1.0;
const BOOST_POINTS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f64,
}

/// Parameters for [`search_ids`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSearch {
    pub query: Option<String>,
    pub where_filter: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for IdSearch {
    fn default() -> Self {
        Self {
            query: None,
            where_filter: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Returns `{id, score}` pairs for matching rows, highest score first.
///
/// Results larger than the per-result budget are dropped; accumulation stops
/// once the response budget would be exceeded.
pub async fn search_ids(
    api: &dyn SocrataApi,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    request: &IdSearch,
) -> Result<Vec<SearchResult>> {
    let estimate = (request.limit as usize).saturating_mul(limits.avg_result_bytes);
    if estimate > limits.max_response_bytes {
        return Err(Error::invalid(format!(
            "limit {} is too large: estimated response of {estimate} bytes exceeds the {} byte budget",
            request.limit, limits.max_response_bytes
        )));
    }

    let query = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    let params = SoqlParams::new()
        .set("$select", ":*, *")
        .set_opt("$q", query)
        .set_opt("$where", request.where_filter.as_deref())
        .limit(request.limit)
        .offset(request.offset);
    let rows = fetch_rows(api, base_url, dataset_id, &params).await?;

    let mut results = Vec::with_capacity(rows.len());
    let mut total_bytes = 0usize;
    for (index, row) in rows.iter().enumerate() {
        let id = row_identifier(row)
            .unwrap_or_else(|| positional_id(request.offset.saturating_add(index as u64)));
        let score = query.map_or(1.0, |q| score_row(row, q));
        let result = SearchResult { id, score };

        let size = serialized_len(&result)?;
        if size > limits.max_result_bytes {
            tracing::warn!(
                target: "opengov::relevance",
                dataset_id,
                size,
                max = limits.max_result_bytes,
                "dropping oversized search result"
            );
            continue;
        }
        if total_bytes + size > limits.max_response_bytes {
            tracing::debug!(target: "opengov::relevance", dataset_id, kept = results.len(), "response budget reached");
            break;
        }
        total_bytes += size;
        results.push(result);
    }

    // `sort_by` is stable: equal scores keep fetch order.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    tracing::debug!(target: "opengov::relevance", dataset_id, results = results.len(), "scored rows");
    Ok(results)
}

/// Scores a row against `query` in `[0, 1]`.
pub fn score_row(row: &Row, query: &str) -> f64 {
    let needle = query.to_lowercase();
    let mut points = 0.0;
    for (field, value) in row {
        let Value::String(text) = value else {
            continue;
        };
        let haystack = text.to_lowercase();
        if !haystack.contains(&needle) {
            continue;
        }
        points += if haystack == needle {
            EXACT_MATCH_POINTS
        } else {
            SUBSTRING_POINTS
        };
        if BOOSTED_FIELDS.contains(&field.as_str()) {
            points += BOOST_POINTS;
        }
    }
    (points / 10.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemSocrataApi;
    use proptest::prelude::*;
    use serde_json::json;

    const BASE: &str = "https://x.gov";

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_exact_match_in_boosted_field_clamps_to_one() {
        assert_eq!(score_row(&row(json!({"name": "Park"})), "park"), 1.0);
    }

    #[test]
    fn test_substring_scores() {
        assert!((score_row(&row(json!({"notes": "city park"})), "park") - 0.1).abs() < 1e-9);
        assert!((score_row(&row(json!({"title": "city park"})), "park") - 0.3).abs() < 1e-9);
        assert_eq!(score_row(&row(json!({"notes": "lake", "n": 5})), "park"), 0.0);
    }

    #[test]
    fn test_non_string_fields_are_ignored() {
        assert_eq!(score_row(&row(json!({"count": 10, "flag": true})), "10"), 0.0);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_rejected_before_fetch() {
        let api = MemSocrataApi::new().with_synthetic_rows("d", 10);
        let request = IdSearch {
            limit: 200_000,
            ..IdSearch::default()
        };
        let err = search_ids(&api, &Limits::default(), BASE, "d", &request)
            .await
            .unwrap_err();
        assert!(err.is_invalid_params());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_without_query_every_row_scores_one() {
        let api = MemSocrataApi::new().with_synthetic_rows("d", 5);
        let results = search_ids(&api, &Limits::default(), BASE, "d", &IdSearch::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.score == 1.0));
        assert_eq!(results[0].id, "row-000000");
        assert_eq!(api.calls()[0].param("$select"), Some(":*, *"));
    }

    #[tokio::test]
    async fn test_rows_without_identifier_get_positional_ids() {
        let api = MemSocrataApi::new().with_rows(
            "d",
            vec![json!({"name": "a"}), json!({"name": "b"}), json!({"name": "c"})],
        );
        let request = IdSearch {
            offset: 1,
            ..IdSearch::default()
        };
        let results = search_ids(&api, &Limits::default(), BASE, "d", &request)
            .await
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["row_1", "row_2"]);
    }

    /// Answers every request with the same rows, whatever the offset.
    struct FixedRows(Value);

    #[async_trait::async_trait]
    impl SocrataApi for FixedRows {
        async fn fetch(
            &self,
            _base_url: &str,
            _path: &str,
            _params: &[(String, String)],
        ) -> std::result::Result<Value, crate::error::RemoteError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_positional_ids_saturate_at_max_offset() {
        let api = FixedRows(json!([{"name": "a"}, {"name": "b"}]));
        let request = IdSearch {
            offset: u64::MAX,
            ..IdSearch::default()
        };
        let results = search_ids(&api, &Limits::default(), BASE, "d", &request)
            .await
            .unwrap();
        let expected = format!("row_{}", u64::MAX);
        assert!(results.iter().all(|r| r.id == expected));
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_results_sort_by_score_with_stable_ties() {
        let api = MemSocrataApi::new().with_rows(
            "d",
            vec![
                json!({"id": "1", "notes": "near the park"}),
                json!({"id": "2", "name": "Park"}),
                json!({"id": "3", "notes": "park trail"}),
            ],
        );
        let request = IdSearch {
            query: Some("park".into()),
            ..IdSearch::default()
        };
        let results = search_ids(&api, &Limits::default(), BASE, "d", &request)
            .await
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "3"]);
        assert_eq!(api.calls()[0].param("$q"), Some("park"));
    }

    #[tokio::test]
    async fn test_oversized_results_are_dropped() {
        let long_id = "x".repeat(3_000);
        let api = MemSocrataApi::new().with_rows(
            "d",
            vec![json!({"id": long_id}), json!({"id": "ok"})],
        );
        let results = search_ids(&api, &Limits::default(), BASE, "d", &IdSearch::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "ok");
    }

    #[tokio::test]
    async fn test_response_budget_stops_accumulation() {
        let api = MemSocrataApi::new().with_synthetic_rows("d", 50);
        let one = serialized_len(&SearchResult { id: "row-000000".into(), score: 1.0 }).unwrap();
        let limits = Limits {
            max_response_bytes: one * 3,
            avg_result_bytes: 1,
            ..Limits::default()
        };
        let request = IdSearch {
            limit: 10,
            ..IdSearch::default()
        };
        let results = search_ids(&api, &limits, BASE, "d", &request)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_score_is_normalized(
            fields in proptest::collection::vec(("[a-z]{1,8}", "[a-z ]{0,20}"), 0..12),
            query in "[a-z]{1,4}",
        ) {
            let mut r = Row::new();
            for (k, v) in fields {
                r.insert(k, Value::String(v));
            }
            let score = score_row(&r, &query);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
