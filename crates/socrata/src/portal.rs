//! Portal-level lookups: catalog, dataset metadata, facets and site metrics.

use crate::client::SocrataApi;
use crate::error::{RemoteError, Result};
use crate::rows::json_kind;
use crate::soql::SoqlParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const CATALOG_PATH: &str = "/api/catalog/v1";
const VIEWS_PATH: &str = "/api/views.json";
const VIEWS_SAMPLE: u64 = 200;
const TOP_CATEGORIES: usize = 10;

/// A facet value and how many datasets carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Categories,
    Tags,
}

impl Facet {
    fn catalog_path(self) -> &'static str {
        match self {
            Self::Categories => "/api/catalog/v1/domain_categories",
            Self::Tags => "/api/catalog/v1/domain_tags",
        }
    }

    fn catalog_key(self) -> &'static str {
        match self {
            Self::Categories => "domain_category",
            Self::Tags => "domain_tag",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub query: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            query: None,
            limit: 10,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteMetrics {
    pub domain: String,
    pub dataset_count: u64,
    pub category_count: usize,
    pub top_categories: Vec<FacetCount>,
}

struct CatalogPage {
    results: Vec<Value>,
    result_set_size: u64,
}

/// Searches the portal's dataset catalog and returns the matching entries.
pub async fn catalog_search(
    api: &dyn SocrataApi,
    base_url: &str,
    host: &str,
    query: &CatalogQuery,
) -> Result<Vec<Value>> {
    Ok(catalog_page(api, base_url, host, query).await?.results)
}

async fn catalog_page(
    api: &dyn SocrataApi,
    base_url: &str,
    host: &str,
    query: &CatalogQuery,
) -> Result<CatalogPage> {
    let params = SoqlParams::new()
        .set("domains", host)
        .set("search_context", host)
        .set_opt("q", query.query.as_deref())
        .set("limit", query.limit.to_string())
        .set("offset", query.offset.to_string());
    let body = api.fetch(base_url, CATALOG_PATH, params.as_slice()).await?;
    let result_set_size = body
        .get("resultSetSize")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(results)) => Ok(CatalogPage {
                results,
                result_set_size,
            }),
            _ => Err(RemoteError::InvalidBody("catalog response has no results array".into()).into()),
        },
        other => Err(RemoteError::InvalidBody(format!(
            "expected a catalog object, got {}",
            json_kind(&other)
        ))
        .into()),
    }
}

/// Full view metadata for one dataset.
pub async fn dataset_metadata(
    api: &dyn SocrataApi,
    base_url: &str,
    dataset_id: &str,
) -> Result<Value> {
    let path = format!("/api/views/{dataset_id}.json");
    Ok(api.fetch(base_url, &path, &[]).await?)
}

/// Column definitions for one dataset.
pub async fn column_info(api: &dyn SocrataApi, base_url: &str, dataset_id: &str) -> Result<Value> {
    let path = format!("/api/views/{dataset_id}/columns.json");
    Ok(api.fetch(base_url, &path, &[]).await?)
}

/// Counts categories or tags across the portal, most common first.
///
/// Tries the catalog facet endpoint, then falls back to aggregating a sample
/// of `/api/views.json`. Fails only when both lookups fail.
pub async fn facet_counts(
    api: &dyn SocrataApi,
    base_url: &str,
    host: &str,
    facet: Facet,
) -> Result<Vec<FacetCount>> {
    let params = SoqlParams::new().set("domains", host);
    let primary = api
        .fetch(base_url, facet.catalog_path(), params.as_slice())
        .await;
    let mut counts = match primary {
        Ok(body) => parse_catalog_facets(&body, facet),
        Err(e) => {
            tracing::info!(
                target: "opengov::fetch",
                host,
                kind = e.kind(),
                "facet endpoint unavailable, aggregating views"
            );
            let params = SoqlParams::new().set("limit", VIEWS_SAMPLE.to_string());
            let views = api.fetch(base_url, VIEWS_PATH, params.as_slice()).await?;
            aggregate_views(&views, facet)
        }
    };
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    Ok(counts)
}

/// Dataset and category totals for a portal.
pub async fn site_metrics(api: &dyn SocrataApi, base_url: &str, host: &str) -> Result<SiteMetrics> {
    let probe = CatalogQuery {
        limit: 1,
        ..CatalogQuery::default()
    };
    let page = catalog_page(api, base_url, host, &probe).await?;
    let categories = facet_counts(api, base_url, host, Facet::Categories).await?;
    Ok(SiteMetrics {
        domain: host.to_string(),
        dataset_count: page.result_set_size,
        category_count: categories.len(),
        top_categories: categories.into_iter().take(TOP_CATEGORIES).collect(),
    })
}

fn parse_catalog_facets(body: &Value, facet: Facet) -> Vec<FacetCount> {
    let entries = body
        .get("results")
        .and_then(Value::as_array)
        .or_else(|| body.as_array());
    entries
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let name = entry.get(facet.catalog_key())?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            let count = match entry.get("count") {
                Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
                Some(Value::String(s)) => s.parse().unwrap_or(0),
                _ => 0,
            };
            Some(FacetCount {
                name: name.to_string(),
                count,
            })
        })
        .collect()
}

fn aggregate_views(views: &Value, facet: Facet) -> Vec<FacetCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for view in views.as_array().into_iter().flatten() {
        match facet {
            Facet::Categories => {
                if let Some(category) = view.get("category").and_then(Value::as_str) {
                    bump(&mut counts, category);
                }
            }
            Facet::Tags => {
                for tag in view.get("tags").and_then(Value::as_array).into_iter().flatten() {
                    if let Some(tag) = tag.as_str() {
                        bump(&mut counts, tag);
                    }
                }
            }
        }
    }
    counts
        .into_iter()
        .map(|(name, count)| FacetCount { name, count })
        .collect()
}

fn bump(counts: &mut BTreeMap<String, u64>, name: &str) {
    let name = name.trim();
    if !name.is_empty() {
        *counts.entry(name.to_string()).or_default() += 1;
    }
}
