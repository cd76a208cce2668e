//! The [`SocrataEngine`] facade shared by every tool.

use crate::cache::{CacheStats, ResponseCache, SharedCache};
use crate::client::{base_url_for, domain_host, HttpSocrataApi, SocrataApi};
use crate::count::count_rows;
use crate::documents::retrieve_documents;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::pagination::{search, RowLimit, SearchResponse};
use crate::portal::{self, CatalogQuery, Facet, FacetCount, SiteMetrics};
use crate::relevance::{search_ids, IdSearch, SearchResult};
use crate::rows::Row;
use crate::soql::{validate_dataset_id, RowFilter};
use serde_json::Value;
use std::sync::Arc;

/// Entry point for every Socrata operation.
///
/// Cheap to clone: the transport and the response cache are shared.
#[derive(Clone)]
pub struct SocrataEngine {
    api: Arc<dyn SocrataApi>,
    cache: SharedCache,
    limits: Limits,
}

impl SocrataEngine {
    pub fn new(api: Arc<dyn SocrataApi>, cache: SharedCache) -> Self {
        Self {
            api,
            cache,
            limits: Limits::default(),
        }
    }

    /// HTTP transport and cache configured from the environment.
    pub fn from_env() -> Result<Self> {
        let api = HttpSocrataApi::from_env()?;
        Ok(Self::new(Arc::new(api), ResponseCache::from_env().shared()))
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    pub async fn count(&self, domain: &str, dataset_id: &str, filter: &RowFilter) -> Result<u64> {
        let dataset_id = validate_dataset_id(dataset_id)?;
        count_rows(self.api.as_ref(), &portal_url(domain)?, dataset_id, filter).await
    }

    pub async fn search(
        &self,
        domain: &str,
        dataset_id: &str,
        filter: &RowFilter,
        limit: Option<RowLimit>,
        offset: u64,
    ) -> Result<SearchResponse> {
        let dataset_id = validate_dataset_id(dataset_id)?;
        search(
            self.api.as_ref(),
            &self.limits,
            &portal_url(domain)?,
            dataset_id,
            filter,
            limit,
            offset,
        )
        .await
    }

    pub async fn retrieve_documents(
        &self,
        domain: &str,
        dataset_id: &str,
        ids: &[String],
    ) -> Result<Vec<Row>> {
        let dataset_id = validate_dataset_id(dataset_id)?;
        retrieve_documents(
            self.api.as_ref(),
            &self.cache,
            &self.limits,
            &portal_url(domain)?,
            dataset_id,
            ids,
        )
        .await
    }

    pub async fn search_ids(
        &self,
        domain: &str,
        dataset_id: &str,
        request: &IdSearch,
    ) -> Result<Vec<SearchResult>> {
        let dataset_id = validate_dataset_id(dataset_id)?;
        search_ids(
            self.api.as_ref(),
            &self.limits,
            &portal_url(domain)?,
            dataset_id,
            request,
        )
        .await
    }

    pub async fn catalog_search(&self, domain: &str, query: &CatalogQuery) -> Result<Vec<Value>> {
        let base_url = portal_url(domain)?;
        portal::catalog_search(self.api.as_ref(), &base_url, domain_host(domain), query).await
    }

    pub async fn dataset_metadata(&self, domain: &str, dataset_id: &str) -> Result<Value> {
        let dataset_id = validate_dataset_id(dataset_id)?;
        portal::dataset_metadata(self.api.as_ref(), &portal_url(domain)?, dataset_id).await
    }

    pub async fn column_info(&self, domain: &str, dataset_id: &str) -> Result<Value> {
        let dataset_id = validate_dataset_id(dataset_id)?;
        portal::column_info(self.api.as_ref(), &portal_url(domain)?, dataset_id).await
    }

    pub async fn categories(&self, domain: &str) -> Result<Vec<FacetCount>> {
        let base_url = portal_url(domain)?;
        portal::facet_counts(self.api.as_ref(), &base_url, domain_host(domain), Facet::Categories)
            .await
    }

    pub async fn tags(&self, domain: &str) -> Result<Vec<FacetCount>> {
        let base_url = portal_url(domain)?;
        portal::facet_counts(self.api.as_ref(), &base_url, domain_host(domain), Facet::Tags).await
    }

    pub async fn site_metrics(&self, domain: &str) -> Result<SiteMetrics> {
        let base_url = portal_url(domain)?;
        portal::site_metrics(self.api.as_ref(), &base_url, domain_host(domain)).await
    }
}

fn portal_url(domain: &str) -> Result<String> {
    if domain_host(domain).is_empty() {
        return Err(Error::invalid("domain must not be empty"));
    }
    Ok(base_url_for(domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemSocrataApi;
    use std::time::Duration;

    fn engine(api: Arc<MemSocrataApi>) -> SocrataEngine {
        SocrataEngine::new(api, ResponseCache::new(1 << 20, Duration::from_secs(60)).shared())
    }

    #[tokio::test]
    async fn test_domain_becomes_https_base_url() {
        let api = Arc::new(MemSocrataApi::new().with_synthetic_rows("abcd-1234", 3));
        engine(api.clone())
            .search("x.gov", "abcd-1234", &RowFilter::default(), None, 0)
            .await
            .unwrap();
        assert!(api.calls().iter().all(|c| c.base_url == "https://x.gov"));
    }

    #[tokio::test]
    async fn test_invalid_dataset_id_is_rejected_without_fetch() {
        let api = Arc::new(MemSocrataApi::new());
        let err = engine(api.clone())
            .dataset_metadata("x.gov", "../../etc")
            .await
            .unwrap_err();
        assert!(err.is_invalid_params());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_domain_is_rejected() {
        let api = Arc::new(MemSocrataApi::new());
        let err = engine(api).categories("  ").await.unwrap_err();
        assert!(err.is_invalid_params());
    }

    #[tokio::test]
    async fn test_document_cache_is_shared_across_clones() {
        let api = Arc::new(MemSocrataApi::new().with_synthetic_rows("abcd-1234", 10));
        let first = engine(api.clone());
        let second = first.clone();
        let ids = vec!["row_2".to_string()];

        first.retrieve_documents("x.gov", "abcd-1234", &ids).await.unwrap();
        let calls = api.calls().len();
        second.retrieve_documents("x.gov", "abcd-1234", &ids).await.unwrap();
        assert_eq!(api.calls().len(), calls);
        assert_eq!(second.cache_stats().hits, 1);
    }
}
