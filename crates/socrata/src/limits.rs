//! Row and byte budgets.

/// Row and byte budgets applied by the engine.
///
/// `row_fetch_cap` of `None` defers to `ROW_FETCH_CAP` at call time so the
/// environment can change between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Largest page the provider accepts in one request.
    pub max_rows: u64,
    /// Rows returned when a large result is previewed without a limit.
    pub default_preview_rows: u64,
    pub row_fetch_cap: Option<u64>,
    /// Most ids accepted by one document retrieval.
    pub max_docs_per_request: usize,
    pub max_row_bytes: usize,
    pub max_result_bytes: usize,
    pub max_response_bytes: usize,
    /// Estimated serialized size of one search result.
    pub avg_result_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rows: 50_000,
            default_preview_rows: 1_000,
            row_fetch_cap: None,
            max_docs_per_request: 50,
            max_row_bytes: 20 * 1024,
            max_result_bytes: 2 * 1024,
            max_response_bytes: 10 * 1024 * 1024,
            avg_result_bytes: 100,
        }
    }
}

impl Limits {
    /// Effective cap on rows fetched for an `"all"` request.
    pub fn row_fetch_cap(&self) -> u64 {
        self.row_fetch_cap
            .unwrap_or_else(opengov_state::row_fetch_cap)
    }
}
