//! Socrata open-data engine.
//!
//! Everything goes through [`SocrataEngine`], which pairs a [`SocrataApi`]
//! transport with a process-wide [`ResponseCache`]:
//!
//! - [`SocrataEngine::search`] decides between a whole result, a bounded
//!   preview, and a capped multi-page fetch, and reports where to resume.
//! - [`SocrataEngine::retrieve_documents`] fetches rows by id (including
//!   positional `row_<N>` ids) and caches the result per id set.
//! - [`SocrataEngine::search_ids`] returns scored `{id, score}` pairs.
//! - Catalog, metadata, facet and site-metric lookups round out the portal view.
//!
//! [`CacheJanitor`] sweeps expired cache entries in the background.

pub mod cache;
pub mod client;
pub mod count;
pub mod documents;
mod engine;
pub mod error;
pub mod identifier;
pub mod janitor;
pub mod limits;
pub mod pagination;
pub mod portal;
pub mod relevance;
pub mod rows;
pub mod soql;
pub mod truncate;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use cache::{CacheStats, ResponseCache, SharedCache};
pub use client::{base_url_for, domain_host, HttpSocrataApi, SocrataApi};
pub use engine::SocrataEngine;
pub use error::{Error, RemoteError, Result};
pub use janitor::CacheJanitor;
pub use limits::Limits;
pub use pagination::{RowLimit, SearchResponse};
pub use portal::{CatalogQuery, FacetCount, SiteMetrics};
pub use relevance::{IdSearch, SearchResult};
pub use rows::Row;
pub use soql::RowFilter;
