//! In-memory `SocrataApi` for tests.
//!
//! Serves `/resource/<id>.json` from registered rows and answers the SoQL
//! subset the engine emits: `count(*)`, `$limit`/`$offset`, `$q` substring
//! matching and `field = 'v'` / `field IN (...)` filters. Anything else in
//! `$where` is ignored. Other paths return canned JSON registered with
//! [`MemSocrataApi::with_response`].

use crate::client::SocrataApi;
use crate::error::RemoteError;
use crate::rows::Row;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;

const PROVIDER_MAX_ROWS: u64 = 50_000;
const PROVIDER_DEFAULT_LIMIT: u64 = 1_000;

/// One request observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub base_url: String,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_count(&self) -> bool {
        self.param("$select") == Some("count(*)")
    }

    pub fn is_resource(&self) -> bool {
        self.path.starts_with("/resource/")
    }
}

enum MemDataset {
    Rows(Vec<Row>),
    /// `total` generated rows of the form `{":id": "row-000042", "n": 42}`.
    Synthetic(u64),
}

#[derive(Default)]
pub struct MemSocrataApi {
    datasets: Mutex<HashMap<String, MemDataset>>,
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_after: Mutex<Option<usize>>,
    failing_paths: Mutex<Vec<String>>,
    count_override: Mutex<HashMap<String, u64>>,
}

impl MemSocrataApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset. Non-object values are dropped.
    pub fn with_rows(self, dataset_id: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        self.datasets
            .lock()
            .insert(dataset_id.to_string(), MemDataset::Rows(rows));
        self
    }

    /// Registers a dataset whose rows are generated on demand.
    pub fn with_synthetic_rows(self, dataset_id: &str, total: u64) -> Self {
        self.datasets
            .lock()
            .insert(dataset_id.to_string(), MemDataset::Synthetic(total));
        self
    }

    /// Makes `count(*)` report `count` regardless of the stored rows.
    pub fn with_reported_count(self, dataset_id: &str, count: u64) -> Self {
        self.count_override
            .lock()
            .insert(dataset_id.to_string(), count);
        self
    }

    pub fn with_response(self, path: &str, body: Value) -> Self {
        self.responses.lock().insert(path.to_string(), body);
        self
    }

    /// Lets the first `successes` calls through; every later call is unreachable.
    pub fn fail_after(self, successes: usize) -> Self {
        *self.fail_after.lock() = Some(successes);
        self
    }

    /// Answers every call to `path` with HTTP 500.
    pub fn fail_path(self, path: &str) -> Self {
        self.failing_paths.lock().push(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Resource calls that fetch rows (count queries excluded).
    pub fn data_calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_resource() && !c.is_count())
            .cloned()
            .collect()
    }

    pub fn count_calls(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_count()).count()
    }

    fn serve_resource(&self, dataset_id: &str, call: &RecordedCall) -> Result<Value, RemoteError> {
        let datasets = self.datasets.lock();
        let Some(dataset) = datasets.get(dataset_id) else {
            return Err(RemoteError::Api {
                status: 404,
                status_text: "Not Found".into(),
                body: json!({"code": "dataset.missing", "message": format!("no dataset {dataset_id}")})
                    .to_string(),
            });
        };

        let total = match dataset {
            MemDataset::Rows(rows) => filtered(rows, call).len() as u64,
            MemDataset::Synthetic(total) => *total,
        };

        if call.is_count() {
            let reported = self
                .count_override
                .lock()
                .get(dataset_id)
                .copied()
                .unwrap_or(total);
            return Ok(json!([{ "count": reported.to_string() }]));
        }

        if call.param("$query").is_some() {
            return Ok(window(dataset, call, 0, PROVIDER_MAX_ROWS));
        }

        let offset = parse_u64(call.param("$offset")).unwrap_or(0);
        let limit = parse_u64(call.param("$limit"))
            .unwrap_or(PROVIDER_DEFAULT_LIMIT)
            .min(PROVIDER_MAX_ROWS);
        Ok(window(dataset, call, offset, limit))
    }
}

#[async_trait]
impl SocrataApi for MemSocrataApi {
    async fn fetch(
        &self,
        base_url: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, RemoteError> {
        let call = RecordedCall {
            base_url: base_url.to_string(),
            path: path.to_string(),
            params: params.to_vec(),
        };
        let index = {
            let mut calls = self.calls.lock();
            calls.push(call.clone());
            calls.len() - 1
        };

        if self.fail_after.lock().is_some_and(|limit| index >= limit) {
            return Err(RemoteError::Unreachable("simulated outage".into()));
        }
        if self.failing_paths.lock().iter().any(|p| p == path) {
            return Err(RemoteError::Api {
                status: 500,
                status_text: "Internal Server Error".into(),
                body: "simulated failure".into(),
            });
        }

        if let Some(dataset_id) = path
            .strip_prefix("/resource/")
            .and_then(|rest| rest.strip_suffix(".json"))
        {
            return self.serve_resource(dataset_id, &call);
        }

        self.responses
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::Api {
                status: 404,
                status_text: "Not Found".into(),
                body: format!("no canned response for {path}"),
            })
    }
}

fn window(dataset: &MemDataset, call: &RecordedCall, offset: u64, limit: u64) -> Value {
    match dataset {
        MemDataset::Rows(rows) => Value::Array(
            filtered(rows, call)
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|row| Value::Object(row.clone()))
                .collect(),
        ),
        MemDataset::Synthetic(total) => {
            let end = offset.saturating_add(limit).min(*total);
            Value::Array(
                (offset.min(end)..end)
                    .map(|n| json!({ ":id": format!("row-{n:06}"), "n": n }))
                    .collect(),
            )
        }
    }
}

fn filtered<'a>(rows: &'a [Row], call: &RecordedCall) -> Vec<&'a Row> {
    let id_filter = call.param("$where").and_then(parse_id_filter);
    let needle = call.param("$q").map(str::to_lowercase);
    rows.iter()
        .filter(|row| match &id_filter {
            Some((field, values)) => row
                .get(field)
                .and_then(scalar_text)
                .is_some_and(|v| values.contains(&v)),
            None => true,
        })
        .filter(|row| match &needle {
            Some(needle) => row.values().any(|v| {
                v.as_str()
                    .is_some_and(|s| s.to_lowercase().contains(needle.as_str()))
            }),
            None => true,
        })
        .collect()
}

fn parse_id_filter(clause: &str) -> Option<(String, Vec<String>)> {
    if let Some((field, rest)) = clause.split_once(" IN (") {
        let list = rest.trim().strip_suffix(')')?;
        let values = list
            .split(", ")
            .map(unquote)
            .collect::<Option<Vec<_>>>()?;
        return Some((field.trim().to_string(), values));
    }
    let (field, value) = clause.split_once(" = ")?;
    Some((field.trim().to_string(), vec![unquote(value)?]))
}

fn unquote(literal: &str) -> Option<String> {
    literal
        .trim()
        .strip_prefix('\'')?
        .strip_suffix('\'')
        .map(|v| v.replace("''", "'"))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.parse().ok())
}
