//! Tool handler implementations for `PortalService`.
//!
//! Each handler deserializes its arguments, resolves the portal domain and
//! returns a `CallToolResult` with pretty JSON text plus the same value as
//! structured content.

use super::PortalService;
use opengov_socrata::{CatalogQuery, Error, IdSearch, Result, RowFilter, RowLimit};
use rmcp::model::{CallToolResult, Content};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map as JsonMap, Value};

/// What `get_data` should look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum DataKind {
    Catalog,
    Categories,
    Tags,
    DatasetMetadata,
    ColumnInfo,
    DataAccess,
    SiteMetrics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetDataArgs {
    #[serde(rename = "type")]
    kind: DataKind,
    domain: Option<String>,
    query: Option<String>,
    dataset_id: Option<String>,
    limit: Option<RowLimit>,
    offset: Option<u64>,
    select: Option<String>,
    #[serde(rename = "where")]
    where_clause: Option<String>,
    order: Option<String>,
    group: Option<String>,
    having: Option<String>,
    q: Option<String>,
    soql_query: Option<String>,
}

impl GetDataArgs {
    fn dataset_id(&self) -> Result<&str> {
        self.dataset_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidParams("datasetId is required for this type".into()))
    }

    fn row_filter(&self) -> RowFilter {
        RowFilter {
            select: self.select.clone(),
            where_clause: self.where_clause.clone(),
            order: self.order.clone(),
            group: self.group.clone(),
            having: self.having.clone(),
            full_text_query: self.q.clone(),
            soql_query: self.soql_query.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    dataset_id: String,
    domain: Option<String>,
    query: Option<String>,
    #[serde(rename = "where")]
    where_filter: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchArgs {
    ids: Vec<String>,
    dataset_id: String,
    domain: Option<String>,
}

impl PortalService {
    /// Catalog, facet, metadata, row and site-metric lookups behind one tool.
    pub(crate) async fn get_data_tool(
        &self,
        args: Option<JsonMap<String, Value>>,
    ) -> Result<CallToolResult> {
        let args: GetDataArgs = parse_args("get_data", args)?;
        let domain = resolve_domain(args.domain.as_deref());
        tracing::debug!(target: "opengov::tools", kind = ?args.kind, %domain, "get_data");

        let structured = match args.kind {
            DataKind::Catalog => {
                let limit = match args.limit {
                    None => 10,
                    Some(RowLimit::Rows(n)) => n,
                    Some(RowLimit::All) => {
                        return Err(Error::InvalidParams(
                            "limit \"all\" is only supported for data-access".into(),
                        ))
                    }
                };
                let query = CatalogQuery {
                    query: args.query.clone(),
                    limit,
                    offset: args.offset.unwrap_or(0),
                };
                let results = self.engine.catalog_search(&domain, &query).await?;
                json!({ "domain": domain, "results": results })
            }
            DataKind::Categories => {
                let categories = self.engine.categories(&domain).await?;
                json!({ "domain": domain, "categories": categories })
            }
            DataKind::Tags => {
                let tags = self.engine.tags(&domain).await?;
                json!({ "domain": domain, "tags": tags })
            }
            DataKind::DatasetMetadata => {
                self.engine
                    .dataset_metadata(&domain, args.dataset_id()?)
                    .await?
            }
            DataKind::ColumnInfo => {
                let dataset_id = args.dataset_id()?;
                let columns = self.engine.column_info(&domain, dataset_id).await?;
                json!({ "datasetId": dataset_id, "columns": columns })
            }
            DataKind::DataAccess => {
                let response = self
                    .engine
                    .search(
                        &domain,
                        args.dataset_id()?,
                        &args.row_filter(),
                        args.limit,
                        args.offset.unwrap_or(0),
                    )
                    .await?;
                to_value(&response)?
            }
            DataKind::SiteMetrics => to_value(&self.engine.site_metrics(&domain).await?)?,
        };
        tool_result(structured)
    }

    /// Relevance-scored row ids for a dataset.
    pub(crate) async fn search_tool(
        &self,
        args: Option<JsonMap<String, Value>>,
    ) -> Result<CallToolResult> {
        let args: SearchArgs = parse_args("search", args)?;
        let domain = resolve_domain(args.domain.as_deref());
        let defaults = IdSearch::default();
        let request = IdSearch {
            query: args.query,
            where_filter: args.where_filter,
            limit: args.limit.unwrap_or(defaults.limit),
            offset: args.offset.unwrap_or(defaults.offset),
        };
        let results = self
            .engine
            .search_ids(&domain, &args.dataset_id, &request)
            .await?;
        tool_result(json!({ "results": results }))
    }

    /// Full rows for a set of ids.
    pub(crate) async fn fetch_tool(
        &self,
        args: Option<JsonMap<String, Value>>,
    ) -> Result<CallToolResult> {
        let args: FetchArgs = parse_args("fetch", args)?;
        let domain = resolve_domain(args.domain.as_deref());
        let documents = self
            .engine
            .retrieve_documents(&domain, &args.dataset_id, &args.ids)
            .await?;
        tool_result(json!({ "documents": documents }))
    }
}

/// Caller-supplied domain, or `DATA_PORTAL_URL` read now.
pub(crate) fn resolve_domain(domain: Option<&str>) -> String {
    domain
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(opengov_state::default_domain)
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Option<JsonMap<String, Value>>) -> Result<T> {
    serde_json::from_value(Value::Object(args.unwrap_or_default()))
        .map_err(|e| Error::InvalidParams(format!("{tool}: {e}")))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::Internal(format!("failed to serialize tool result: {e}")))
}

fn tool_result(structured: Value) -> Result<CallToolResult> {
    let text = serde_json::to_string_pretty(&structured)
        .map_err(|e| Error::Internal(format!("failed to render tool result: {e}")))?;
    Ok(CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(structured),
        is_error: Some(false),
        meta: None,
    })
}
