//! Strong-pokemon recommendations served from a persisted, time-boxed cache
//! of the top scorers in a random catalog sample.

mod cache;
mod fallback;
mod refresher;
mod types;

pub use cache::{RecommendationCache, CACHE_PREFIX, TOP_STRONG_CACHE_KEY};
pub use fallback::{fallback_pair, LEGENDARY_IDS};
pub use refresher::{RecommendationBatch, RecommendationRefresher};
pub use types::{RankedPokemon, RecommendedPokemon};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};

use crate::catalog::{fetch_details_batch, Catalog};
use crate::models::PokemonDetail;
use crate::settings::RecommendationSettings;
use crate::storage::KvStore;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRefresh {
    AlreadyFresh,
    Rebuilt,
    /// Nothing usable could be fetched or saved; any previous cache is kept.
    Failed,
}

#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<dyn Catalog>,
    kv: KvStore,
    settings: RecommendationSettings,
    max_species_id: u32,
}

impl RecommendationEngine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        kv: KvStore,
        settings: RecommendationSettings,
        max_species_id: u32,
    ) -> Self {
        Self {
            catalog,
            kv,
            settings,
            max_species_id,
        }
    }

    async fn load_cache(&self) -> Option<RecommendationCache> {
        self.kv.get(TOP_STRONG_CACHE_KEY, None).await
    }

    pub async fn ensure_fresh_cache(&self) -> CacheRefresh {
        self.ensure_fresh_cache_at(Utc::now()).await
    }

    pub async fn ensure_fresh_cache_at(&self, now: DateTime<Utc>) -> CacheRefresh {
        if let Some(cache) = self.load_cache().await {
            if cache.is_fresh_at(now, self.settings.ttl()) {
                return CacheRefresh::AlreadyFresh;
            }
        }

        let total = self.catalog.total_count().await;
        let upper = total.min(self.max_species_id) as usize;
        if upper == 0 {
            log_warn!("Catalog total unavailable; recommendation cache not rebuilt");
            return CacheRefresh::Failed;
        }

        let ids = {
            let mut rng = rand::thread_rng();
            let amount = self.settings.sample_size.min(upper);
            rand::seq::index::sample(&mut rng, upper, amount)
                .into_iter()
                .map(|index| index as u32 + 1)
                .collect::<Vec<u32>>()
        };

        let details: Vec<PokemonDetail> =
            fetch_details_batch(self.catalog.as_ref(), &ids, self.settings.fetch_concurrency)
                .await
                .into_iter()
                .filter_map(|(_, detail)| detail)
                .collect();

        if details.is_empty() {
            log_warn!("No catalog details fetched for {} sampled ids", ids.len());
            return CacheRefresh::Failed;
        }

        let cache = RecommendationCache::build(&details, self.settings.keep_top, now);
        if !self.kv.set(TOP_STRONG_CACHE_KEY, &cache).await {
            log_error!("Failed to persist recommendation cache");
            return CacheRefresh::Failed;
        }

        log_info!(
            "Rebuilt recommendation cache: {} of {} sampled entries kept",
            cache.entries.len(),
            details.len()
        );
        CacheRefresh::Rebuilt
    }

    pub async fn get_random_pair(&self) -> Vec<RecommendedPokemon> {
        self.get_random_pair_at(Utc::now()).await
    }

    /// Two distinct cached entries (one if the cache holds one). Empty when
    /// the cache is missing or stale.
    pub async fn get_random_pair_at(&self, now: DateTime<Utc>) -> Vec<RecommendedPokemon> {
        let Some(cache) = self.load_cache().await else {
            return Vec::new();
        };
        if !cache.is_fresh_at(now, self.settings.ttl()) {
            return Vec::new();
        }

        let mut rng = rand::thread_rng();
        let picked: Vec<&RankedPokemon> = cache.entries.choose_multiple(&mut rng, 2).collect();
        picked
            .into_iter()
            .map(|entry| entry.recommend(rng.gen_range(70..100)))
            .collect()
    }

    /// Cached pair, rebuilding the cache first if needed; the synthetic
    /// legendary pair when nothing else is available.
    pub async fn recommendations(&self) -> Vec<RecommendedPokemon> {
        self.ensure_fresh_cache().await;

        let pair = self.get_random_pair().await;
        if pair.is_empty() {
            log_warn!("Serving fallback recommendations");
            return fallback_pair();
        }
        pair
    }

    /// Drop expired documents under the cache prefix.
    pub async fn sweep_stale(&self) -> usize {
        self.kv.sweep_expired(CACHE_PREFIX, self.settings.ttl()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{detail, FakeCatalog};
    use std::collections::HashSet;

    fn settings() -> RecommendationSettings {
        RecommendationSettings {
            sample_size: 20,
            fetch_concurrency: 4,
            keep_top: 5,
            ..RecommendationSettings::default()
        }
    }

    fn catalog_of(count: u32) -> FakeCatalog {
        (1..=count).fold(FakeCatalog::new().with_total(count), |catalog, id| {
            catalog.with_detail(detail(id, &format!("mon-{id}"), &[("hp", id), ("attack", 2 * id)], &["normal"]))
        })
    }

    fn engine(catalog: Arc<FakeCatalog>) -> (tempfile::TempDir, RecommendationEngine) {
        let dir = tempfile::tempdir().unwrap();
        let kv = KvStore::open(dir.path().join("kv.sqlite3"));
        (dir, RecommendationEngine::new(catalog, kv, settings(), 1010))
    }

    #[tokio::test]
    async fn rebuild_samples_unique_ids_and_keeps_the_strongest() {
        let catalog = Arc::new(catalog_of(30));
        let (_dir, engine) = engine(catalog.clone());

        assert_eq!(engine.ensure_fresh_cache().await, CacheRefresh::Rebuilt);

        let requested = catalog.requested_ids();
        assert_eq!(requested.len(), 20);
        assert_eq!(requested.iter().collect::<HashSet<_>>().len(), 20);
        assert!(requested.iter().all(|id| (1..=30).contains(id)));
        assert!(catalog.max_in_flight() <= 4);

        let cache = engine.load_cache().await.unwrap();
        assert_eq!(cache.entries.len(), 5);
        assert!(cache.entries.windows(2).all(|pair| pair[0].bst >= pair[1].bst));

        let mut top: Vec<u32> = requested.clone();
        top.sort_unstable_by(|a, b| b.cmp(a));
        let cached: Vec<u32> = cache.entries.iter().map(|entry| entry.id).collect();
        assert_eq!(cached, top[..5].to_vec());
    }

    #[tokio::test]
    async fn fresh_cache_is_not_rebuilt_until_it_expires() {
        let catalog = Arc::new(catalog_of(30));
        let (_dir, engine) = engine(catalog.clone());
        let built = Utc::now();

        assert_eq!(engine.ensure_fresh_cache_at(built).await, CacheRefresh::Rebuilt);
        let calls = catalog.detail_calls();

        let almost = built + chrono::Duration::hours(12) - chrono::Duration::milliseconds(1);
        assert_eq!(engine.ensure_fresh_cache_at(almost).await, CacheRefresh::AlreadyFresh);
        assert_eq!(catalog.detail_calls(), calls);

        let expired = built + chrono::Duration::hours(12) + chrono::Duration::milliseconds(1);
        assert!(engine.get_random_pair_at(expired).await.is_empty());
        assert_eq!(engine.ensure_fresh_cache_at(expired).await, CacheRefresh::Rebuilt);
    }

    #[tokio::test]
    async fn random_pair_is_distinct() {
        let (_dir, engine) = engine(Arc::new(catalog_of(30)));
        engine.ensure_fresh_cache().await;

        for _ in 0..200 {
            let pair = engine.get_random_pair().await;
            assert_eq!(pair.len(), 2);
            assert_ne!(pair[0].pokemon.id, pair[1].pokemon.id);
            assert!(pair.iter().all(|entry| (70..=99).contains(&entry.pokemon.level)));
        }
    }

    #[tokio::test]
    async fn single_entry_cache_yields_one() {
        let (_dir, engine) = engine(Arc::new(catalog_of(1)));
        engine.ensure_fresh_cache().await;

        let pair = engine.get_random_pair().await;
        assert_eq!(pair.len(), 1);
        assert_eq!(pair[0].pokemon.id, 1);
        assert_eq!(pair[0].bst, 3);
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_the_previous_cache() {
        let (dir, engine) = engine(Arc::new(catalog_of(10)));
        let built = Utc::now();
        engine.ensure_fresh_cache_at(built).await;
        let previous = engine.load_cache().await.unwrap();

        let mut broken = FakeCatalog::new().with_total(10);
        for id in 1..=10 {
            broken = broken.failing(id);
        }
        let stale_engine = RecommendationEngine::new(
            Arc::new(broken),
            KvStore::open(dir.path().join("kv.sqlite3")),
            settings(),
            1010,
        );

        let later = built + chrono::Duration::hours(13);
        assert_eq!(stale_engine.ensure_fresh_cache_at(later).await, CacheRefresh::Failed);
        assert_eq!(stale_engine.load_cache().await, Some(previous));
    }

    #[tokio::test]
    async fn unreachable_catalog_serves_the_fallback() {
        let (_dir, engine) = engine(Arc::new(FakeCatalog::new()));

        assert!(engine.get_random_pair().await.is_empty());
        let fallback = engine.recommendations().await;
        assert_eq!(fallback.len(), 2);
        assert!(fallback
            .iter()
            .all(|entry| LEGENDARY_IDS.contains(&entry.pokemon.id)));
    }

    #[tokio::test]
    async fn sampling_is_bounded_by_the_species_ceiling() {
        let catalog = Arc::new(catalog_of(30).with_total(5000));
        let dir = tempfile::tempdir().unwrap();
        let engine = RecommendationEngine::new(
            catalog.clone(),
            KvStore::open(dir.path().join("kv.sqlite3")),
            settings(),
            25,
        );

        engine.ensure_fresh_cache().await;
        assert!(catalog.requested_ids().iter().all(|id| (1..=25).contains(id)));
    }

    #[tokio::test]
    async fn sweep_drops_expired_cache_documents() {
        let (_dir, engine) = engine(Arc::new(catalog_of(10)));
        let long_ago = Utc::now() - chrono::Duration::hours(24);
        engine.ensure_fresh_cache_at(long_ago).await;

        assert_eq!(engine.sweep_stale().await, 1);
        assert!(engine.load_cache().await.is_none());
    }
}
