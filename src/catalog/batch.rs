use futures::stream::{self, StreamExt};

use super::Catalog;
use crate::models::PokemonDetail;

// Set to true to log every batch size and failure count
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Fetch details for `ids` with at most `concurrency` requests in flight.
///
/// Completion order is unspecified; every id gets exactly one entry, with
/// `None` marking a failed fetch. One failure never cancels its siblings.
pub async fn fetch_details_batch(
    catalog: &dyn Catalog,
    ids: &[u32],
    concurrency: usize,
) -> Vec<(u32, Option<PokemonDetail>)> {
    let limit = concurrency.max(1);

    let outcomes: Vec<(u32, Option<PokemonDetail>)> = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, catalog.detail(id).await) })
        .buffer_unordered(limit)
        .collect()
        .await;

    let failed = outcomes.iter().filter(|(_, detail)| detail.is_none()).count();
    log_info!(
        "Fetched {} catalog details ({} failed, concurrency {})",
        outcomes.len(),
        failed,
        limit
    );

    outcomes
}
