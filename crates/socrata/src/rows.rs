//! Rows as ordered JSON maps, and fetching them from `/resource/<id>.json`.

use crate::client::SocrataApi;
use crate::error::{Error, RemoteError, Result};
use crate::soql::{dataset_path, SoqlParams};
use serde::Serialize;
use serde_json::{Map, Value};

/// One dataset record: an ordered map of column name to JSON value.
pub type Row = Map<String, Value>;

/// Fetches rows from a dataset's resource endpoint.
pub(crate) async fn fetch_rows(
    api: &dyn SocrataApi,
    base_url: &str,
    dataset_id: &str,
    params: &SoqlParams,
) -> Result<Vec<Row>, RemoteError> {
    let body = api
        .fetch(base_url, &dataset_path(dataset_id), params.as_slice())
        .await?;
    rows_from_value(body)
}

/// Interprets a resource response as rows. Non-object elements are skipped.
pub(crate) fn rows_from_value(value: Value) -> Result<Vec<Row>, RemoteError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()),
        other => Err(RemoteError::InvalidBody(format!(
            "expected a JSON array of rows, got {}",
            json_kind(&other)
        ))),
    }
}

/// Size of `value` serialized as compact JSON.
pub fn serialized_len<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(|e| Error::internal("failed to measure serialized size", e))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_array_keeps_objects_only() {
        let rows = rows_from_value(json!([{"a": 1}, 7, {"b": "x"}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["b"], "x");
    }

    #[test]
    fn test_rows_from_object_is_invalid_body() {
        let err = rows_from_value(json!({"error": true, "message": "bad query"})).unwrap_err();
        assert!(err.to_string().contains("got an object"), "{err}");
    }

    #[test]
    fn test_serialized_len_matches_compact_json() {
        let value = json!({"k": "v"});
        assert_eq!(serialized_len(&value).unwrap(), r#"{"k":"v"}"#.len());
    }
}
