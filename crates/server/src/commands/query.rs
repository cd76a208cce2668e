//! Handler for the `query` command.

use crate::app::resolve_domain;
use anyhow::{Context, Result};
use opengov_socrata::{RowFilter, RowLimit, SocrataEngine};
use tokio::runtime::Runtime;

/// Runs one data-access search and prints the response as pretty JSON.
pub(crate) fn handle_query_command(
    dataset_id: String,
    domain: Option<String>,
    where_clause: Option<String>,
    limit: Option<RowLimit>,
    offset: u64,
) -> Result<()> {
    let engine = SocrataEngine::from_env()?;
    let domain = resolve_domain(domain.as_deref());
    let filter = RowFilter {
        where_clause,
        ..Default::default()
    };

    let rt = Runtime::new()?;
    let response = rt
        .block_on(engine.search(&domain, &dataset_id, &filter, limit, offset))
        .with_context(|| format!("query against dataset {dataset_id} failed"))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
