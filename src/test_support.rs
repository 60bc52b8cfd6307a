//! Scripted in-memory catalog for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU32, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::models::{
    catalog::{Artwork, OtherSprites, Sprites},
    NamedResource, PokemonDetail, PokemonSummary, StatEntry, TypeSlot,
};

pub fn detail(id: u32, name: &str, stats: &[(&str, u32)], types: &[&str]) -> PokemonDetail {
    PokemonDetail {
        id,
        name: name.to_string(),
        base_experience: Some(id * 10),
        sprites: Sprites {
            front_default: Some(format!("https://img/{id}.png")),
            other: Some(OtherSprites {
                official_artwork: Some(Artwork {
                    front_default: Some(format!("https://art/{id}.png")),
                }),
            }),
        },
        stats: stats
            .iter()
            .map(|(stat, value)| StatEntry {
                base_stat: *value,
                stat: NamedResource {
                    name: stat.to_string(),
                    url: String::new(),
                },
            })
            .collect(),
        types: types
            .iter()
            .enumerate()
            .map(|(index, kind)| TypeSlot {
                slot: index as u32 + 1,
                kind: NamedResource {
                    name: kind.to_string(),
                    url: String::new(),
                },
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    details: HashMap<u32, PokemonDetail>,
    failing: HashSet<u32>,
    total: u32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    detail_calls: AtomicU32,
    requested: Mutex<Vec<u32>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detail(mut self, detail: PokemonDetail) -> Self {
        self.details.insert(detail.id, detail);
        self
    }

    pub fn failing(mut self, id: u32) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn with_total(mut self, total: u32) -> Self {
        self.total = total;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> u32 {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn requested_ids(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn total_count(&self) -> u32 {
        self.total
    }

    async fn detail(&self, id: u32) -> Option<PokemonDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(id);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Let sibling requests start so the ceiling is actually exercised.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&id) {
            return None;
        }
        self.details.get(&id).cloned()
    }

    async fn list_summaries(&self, limit: u32) -> Vec<PokemonSummary> {
        let mut ids: Vec<u32> = self.details.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .take(limit as usize)
            .map(|id| PokemonSummary {
                id,
                name: self.details[&id].name.clone(),
                url: format!("https://catalog/pokemon/{id}/"),
            })
            .collect()
    }
}
