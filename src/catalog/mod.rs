//! Read-only access to the remote creature catalog.

mod batch;
mod client;

pub use batch::fetch_details_batch;
pub use client::PokeApiClient;

use async_trait::async_trait;

use crate::models::{PokemonDetail, PokemonSummary};

/// Catalog operations never fail outward: transport errors, 404s and bad
/// payloads collapse to `0`, `None` or an empty list and are logged.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Size of the remote catalog, 0 when it cannot be reached.
    async fn total_count(&self) -> u32;

    /// Detail for one id; `None` on any failure or out-of-range id.
    async fn detail(&self, id: u32) -> Option<PokemonDetail>;

    /// The first `limit` listing rows, for sampling.
    async fn list_summaries(&self, limit: u32) -> Vec<PokemonSummary>;
}
