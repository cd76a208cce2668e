//! Mapping from filter arguments to SoQL query parameters.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Optional SoQL clauses a caller can attach to a row query.
///
/// `soql_query` is a complete SoQL statement; when present it takes the
/// raw-query path and every other clause is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<String>,
    #[serde(default, alias = "q", skip_serializing_if = "Option::is_none")]
    pub full_text_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soql_query: Option<String>,
}

impl RowFilter {
    /// Returns the raw SoQL statement when the caller supplied a non-blank one.
    pub fn raw_query(&self) -> Option<&str> {
        non_blank(self.soql_query.as_deref())
    }

    pub fn has_ordering(&self) -> bool {
        non_blank(self.order.as_deref()).is_some() || non_blank(self.group.as_deref()).is_some()
    }
}

/// Ordered list of `$`-prefixed query pairs sent to the resource endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoqlParams {
    pairs: Vec<(String, String)>,
}

impl SoqlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` unless `value` is blank.
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            return self;
        }
        self.pairs.retain(|(k, _)| k != key);
        self.pairs.push((key.to_string(), value));
        self
    }

    pub fn set_opt(self, key: &str, value: Option<&str>) -> Self {
        match non_blank(value) {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn limit(self, n: u64) -> Self {
        self.set("$limit", n.to_string())
    }

    /// Sets `$offset`; zero is the server default and is not sent.
    pub fn offset(self, n: u64) -> Self {
        if n == 0 {
            self
        } else {
            self.set("$offset", n.to_string())
        }
    }

    /// Clause parameters for a structured filter (no limit or offset).
    pub fn from_filter(filter: &RowFilter) -> Self {
        Self::new()
            .set_opt("$select", filter.select.as_deref())
            .set_opt("$where", filter.where_clause.as_deref())
            .set_opt("$order", filter.order.as_deref())
            .set_opt("$group", filter.group.as_deref())
            .set_opt("$having", filter.having.as_deref())
            .set_opt("$q", filter.full_text_query.as_deref())
    }

    pub fn raw(query: &str) -> Self {
        Self::new().set("$query", query)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Resource path for a dataset's row endpoint.
pub fn dataset_path(dataset_id: &str) -> String {
    format!("/resource/{dataset_id}.json")
}

/// Rejects dataset identifiers that could escape the resource path.
pub fn validate_dataset_id(dataset_id: &str) -> Result<&str> {
    let id = dataset_id.trim();
    if id.is_empty() {
        return Err(Error::invalid("datasetId is required"));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Error::invalid(format!(
            "datasetId '{id}' must contain only letters, digits, '-' or '_'"
        )));
    }
    Ok(id)
}

/// Quotes a string literal for a SoQL expression.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Builds `field = 'v'` or `field IN ('a', 'b')`.
pub fn id_filter(field: &str, ids: &[&str]) -> String {
    match ids {
        [single] => format!("{field} = {}", quote_literal(single)),
        many => {
            let quoted: Vec<String> = many.iter().map(|id| quote_literal(id)).collect();
            format!("{field} IN ({})", quoted.join(", "))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
