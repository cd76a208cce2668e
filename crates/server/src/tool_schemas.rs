//! MCP tool schema definitions for `PortalService`.

use rmcp::model::{Tool, ToolAnnotations};
use serde_json::{json, Map as JsonMap, Value};
use std::sync::Arc;

pub(crate) const GET_DATA: &str = "get_data";
pub(crate) const SEARCH: &str = "search";
pub(crate) const FETCH: &str = "fetch";

/// Builds an object schema from a `properties` map and required keys.
fn object_schema(properties: Value, required: &[&str]) -> Arc<JsonMap<String, Value>> {
    let mut schema = JsonMap::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), properties);
    if !required.is_empty() {
        schema.insert("required".into(), json!(required));
    }
    schema.insert("additionalProperties".into(), json!(false));
    Arc::new(schema)
}

fn domain_property() -> Value {
    json!({
        "type": "string",
        "description": "Portal domain, e.g. data.cityofchicago.org. Defaults to DATA_PORTAL_URL."
    })
}

fn read_only() -> Option<ToolAnnotations> {
    Some(ToolAnnotations {
        read_only_hint: Some(true),
        open_world_hint: Some(true),
        ..ToolAnnotations::default()
    })
}

fn get_data_schema() -> Arc<JsonMap<String, Value>> {
    object_schema(
        json!({
            "type": {
                "type": "string",
                "enum": [
                    "catalog",
                    "categories",
                    "tags",
                    "dataset-metadata",
                    "column-info",
                    "data-access",
                    "site-metrics"
                ],
                "description": "Kind of lookup to perform"
            },
            "domain": domain_property(),
            "query": {
                "type": "string",
                "description": "Catalog search text (type=catalog)"
            },
            "datasetId": {
                "type": "string",
                "description": "Dataset identifier such as ijzp-q8t2. Required for dataset-metadata, column-info and data-access."
            },
            "limit": {
                "oneOf": [
                    {"type": "integer", "minimum": 0},
                    {"type": "string", "enum": ["all"]}
                ],
                "description": "Rows or catalog entries to return. \"all\" fetches every row up to ROW_FETCH_CAP (data-access only)."
            },
            "offset": {"type": "integer", "minimum": 0},
            "select": {"type": "string", "description": "SoQL $select"},
            "where": {"type": "string", "description": "SoQL $where"},
            "order": {"type": "string", "description": "SoQL $order"},
            "group": {"type": "string", "description": "SoQL $group"},
            "having": {"type": "string", "description": "SoQL $having"},
            "q": {"type": "string", "description": "Full-text search across row values"},
            "soqlQuery": {
                "type": "string",
                "description": "Complete SoQL statement; overrides the other SoQL arguments"
            }
        }),
        &["type"],
    )
}

fn search_schema() -> Arc<JsonMap<String, Value>> {
    object_schema(
        json!({
            "datasetId": {"type": "string", "description": "Dataset identifier"},
            "domain": domain_property(),
            "query": {"type": "string", "description": "Text to match and score rows against"},
            "where": {"type": "string", "description": "SoQL $where filter"},
            "limit": {"type": "integer", "minimum": 0, "default": 100},
            "offset": {"type": "integer", "minimum": 0, "default": 0}
        }),
        &["datasetId"],
    )
}

fn fetch_schema() -> Arc<JsonMap<String, Value>> {
    object_schema(
        json!({
            "ids": {
                "type": "array",
                "items": {"type": "string"},
                "maxItems": 50,
                "description": "Row ids from search results; row_<N> addresses a row by offset"
            },
            "datasetId": {"type": "string", "description": "Dataset identifier"},
            "domain": domain_property()
        }),
        &["ids", "datasetId"],
    )
}

/// Returns every tool the server exposes.
pub(crate) fn portal_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: GET_DATA.into(),
            title: Some("Query an open-data portal".into()),
            description: Some(
                "Browse a Socrata portal: search the catalog, list categories or tags, read dataset metadata and columns, query rows with SoQL, or summarize the site."
                    .into(),
            ),
            input_schema: get_data_schema(),
            output_schema: None,
            annotations: read_only(),
            icons: None,
            meta: None,
        },
        Tool {
            name: SEARCH.into(),
            title: Some("Search dataset rows".into()),
            description: Some(
                "Find rows in a dataset matching a text query and return their ids ranked by relevance."
                    .into(),
            ),
            input_schema: search_schema(),
            output_schema: None,
            annotations: read_only(),
            icons: None,
            meta: None,
        },
        Tool {
            name: FETCH.into(),
            title: Some("Fetch rows by id".into()),
            description: Some(
                "Retrieve full rows for ids returned by search. Oversized rows are truncated."
                    .into(),
            ),
            input_schema: fetch_schema(),
            output_schema: None,
            annotations: read_only(),
            icons: None,
            meta: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_is_a_closed_object() {
        for tool in portal_tools() {
            assert_eq!(tool.input_schema.get("type"), Some(&json!("object")), "{}", tool.name);
            assert_eq!(
                tool.input_schema.get("additionalProperties"),
                Some(&json!(false)),
                "{}",
                tool.name
            );
        }
    }

    #[test]
    fn test_tool_names_are_unique_and_stable() {
        let names: Vec<String> = portal_tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, [GET_DATA, SEARCH, FETCH]);
    }

    #[test]
    fn test_required_arguments() {
        let tools = portal_tools();
        let required = |name: &str| {
            tools
                .iter()
                .find(|t| t.name == name)
                .and_then(|t| t.input_schema.get("required").cloned())
        };
        assert_eq!(required(GET_DATA), Some(json!(["type"])));
        assert_eq!(required(SEARCH), Some(json!(["datasetId"])));
        assert_eq!(required(FETCH), Some(json!(["ids", "datasetId"])));
    }

    #[test]
    fn test_get_data_type_enum_lists_all_kinds() {
        let schema = get_data_schema();
        let kinds = schema["properties"]["type"]["enum"].as_array().unwrap();
        assert_eq!(kinds.len(), 7);
        assert!(kinds.contains(&json!("site-metrics")));
    }
}
