//! Fetch rows by id, with positional ids and a shared result cache.

use crate::cache::SharedCache;
use crate::client::SocrataApi;
use crate::error::{Error, Result};
use crate::identifier::{detect_identifier_field, parse_positional_id};
use crate::limits::Limits;
use crate::rows::{fetch_rows, Row};
use crate::soql::{id_filter, SoqlParams};
use crate::truncate::enforce_row_size;

const KEY_SEPARATOR: char = '\u{1f}';

/// Cache key for an id set. Ids are sorted so caller ordering does not matter.
pub fn cache_key(base_url: &str, dataset_id: &str, ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut key = format!("{base_url}{KEY_SEPARATOR}{dataset_id}");
    for id in sorted {
        key.push(KEY_SEPARATOR);
        key.push_str(id);
    }
    key
}

/// Returns the rows named by `ids`.
///
/// Ids of the form `row_<N>` address rows by offset; all others match the
/// dataset's identifier column. A cached result for the same id set is
/// returned as is. When a fetch fails after some rows were collected, the
/// partial result is returned (and not cached).
pub async fn retrieve_documents(
    api: &dyn SocrataApi,
    cache: &SharedCache,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    ids: &[String],
) -> Result<Vec<Row>> {
    if ids.len() > limits.max_docs_per_request {
        return Err(Error::invalid(format!(
            "too many ids: {} requested, at most {} per request",
            ids.len(),
            limits.max_docs_per_request
        )));
    }
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let key = cache_key(base_url, dataset_id, ids);
    let cached = cache.lock().get(&key);
    if let Some(rows) = cached {
        tracing::debug!(target: "opengov::documents", dataset_id, rows = rows.len(), "cache hit");
        return Ok(rows.as_ref().clone());
    }

    let mut positional = Vec::new();
    let mut regular = Vec::new();
    for id in ids {
        match parse_positional_id(id) {
            Some(offset) => positional.push(offset),
            None => regular.push(id.as_str()),
        }
    }

    let mut collected = Vec::new();
    let outcome = collect_rows(
        api,
        limits,
        base_url,
        dataset_id,
        &regular,
        &positional,
        &mut collected,
    )
    .await;

    match outcome {
        Ok(()) => {
            let stored = cache.lock().set(key, collected.clone())?;
            tracing::debug!(
                target: "opengov::documents",
                dataset_id,
                rows = collected.len(),
                cached = stored,
                "retrieved documents"
            );
            Ok(collected)
        }
        Err(e) if !collected.is_empty() => {
            tracing::warn!(
                target: "opengov::documents",
                dataset_id,
                rows = collected.len(),
                error = %e,
                "returning partial documents after fetch failure"
            );
            Ok(collected)
        }
        Err(e) => Err(e),
    }
}

async fn collect_rows(
    api: &dyn SocrataApi,
    limits: &Limits,
    base_url: &str,
    dataset_id: &str,
    regular: &[&str],
    positional: &[u64],
    out: &mut Vec<Row>,
) -> Result<()> {
    if !regular.is_empty() {
        let field = detect_identifier_field(api, base_url, dataset_id).await;
        let params = SoqlParams::new()
            .set("$select", ":*, *")
            .set("$where", id_filter(field, regular))
            .limit(limits.max_rows);
        for row in fetch_rows(api, base_url, dataset_id, &params).await? {
            out.push(enforce_row_size(row, limits.max_row_bytes)?);
        }
    }

    let (Some(&start), Some(&end)) = (positional.iter().min(), positional.iter().max()) else {
        return Ok(());
    };
    let span = (end - start).saturating_add(1).min(limits.max_rows);
    let params = SoqlParams::new()
        .set("$select", ":*, *")
        .limit(span)
        .offset(start);
    let window = fetch_rows(api, base_url, dataset_id, &params).await?;
    for offset in positional {
        let index = usize::try_from(offset - start).ok();
        match index.and_then(|i| window.get(i)) {
            Some(row) => out.push(enforce_row_size(row.clone(), limits.max_row_bytes)?),
            None => {
                tracing::debug!(
                    target: "opengov::documents",
                    dataset_id,
                    offset,
                    "positional row outside fetched range"
                );
            }
        }
    }
    Ok(())
}
