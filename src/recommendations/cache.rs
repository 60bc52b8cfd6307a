use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::RankedPokemon;
use crate::models::PokemonDetail;

pub const CACHE_PREFIX: &str = "cache:";
pub const TOP_STRONG_CACHE_KEY: &str = "cache:top_strong";

/// The persisted top-N list. `builtAt` is epoch milliseconds so the storage
/// sweeper can expire it without knowing this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCache {
    pub built_at: i64,
    pub entries: Vec<RankedPokemon>,
}

impl RecommendationCache {
    /// Rank `details` by BST, strongest first, keeping the first `keep_top`.
    /// Equal scores keep their input order.
    pub fn build(details: &[PokemonDetail], keep_top: usize, now: DateTime<Utc>) -> Self {
        let mut entries: Vec<RankedPokemon> = details.iter().map(RankedPokemon::from_detail).collect();
        entries.sort_by(|a, b| b.bst.cmp(&a.bst));
        entries.truncate(keep_top);

        Self {
            built_at: now.timestamp_millis(),
            entries,
        }
    }

    /// Usable while non-empty and younger than `ttl`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.timestamp_millis().saturating_sub(self.built_at) < ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::detail;
    use chrono::TimeZone;

    const TTL: Duration = Duration::from_secs(12 * 60 * 60);

    fn built_at_epoch() -> (DateTime<Utc>, RecommendationCache) {
        let built = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let cache = RecommendationCache::build(&[detail(1, "a", &[("hp", 10)], &[])], 10, built);
        (built, cache)
    }

    #[test]
    fn freshness_ends_exactly_at_the_ttl() {
        let (built, cache) = built_at_epoch();
        let ttl = chrono::Duration::from_std(TTL).unwrap();
        let one_ms = chrono::Duration::milliseconds(1);

        assert!(cache.is_fresh_at(built, TTL));
        assert!(cache.is_fresh_at(built + ttl - one_ms, TTL));
        assert!(!cache.is_fresh_at(built + ttl, TTL));
        assert!(!cache.is_fresh_at(built + ttl + one_ms, TTL));
    }

    #[test]
    fn empty_cache_is_never_fresh() {
        let (built, mut cache) = built_at_epoch();
        cache.entries.clear();
        assert!(!cache.is_fresh_at(built, TTL));
    }

    #[test]
    fn build_ranks_by_total_and_truncates() {
        let details = vec![
            detail(1, "weak", &[("hp", 10), ("attack", 10)], &[]),
            detail(2, "strong", &[("hp", 100), ("attack", 120)], &[]),
            detail(3, "middle", &[("hp", 50), ("attack", 5)], &[]),
            detail(4, "middle-too", &[("hp", 55)], &[]),
        ];

        let cache = RecommendationCache::build(&details, 3, Utc::now());
        let ranked: Vec<(u32, u32)> = cache.entries.iter().map(|e| (e.id, e.bst)).collect();
        assert_eq!(ranked, vec![(2, 220), (3, 55), (4, 55)]);
    }
}
