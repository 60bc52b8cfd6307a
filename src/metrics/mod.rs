mod types;

pub use types::{PokemonMetrics, StrongestPokemon, NO_DATA};

use std::{collections::HashMap, sync::Arc};

use crate::catalog::Catalog;
use crate::models::CapturedPokemon;
use crate::reconcile::Reconciler;

/// Derived roster statistics. Nothing here is persisted; every call recomputes.
#[derive(Clone)]
pub struct MetricsEngine {
    catalog: Arc<dyn Catalog>,
    reconciler: Reconciler,
}

impl MetricsEngine {
    pub fn new(catalog: Arc<dyn Catalog>, reconciler: Reconciler) -> Self {
        Self {
            catalog,
            reconciler,
        }
    }

    /// Without an explicit roster the live one is reconciled first.
    pub async fn compute(&self, roster: Option<Vec<CapturedPokemon>>) -> PokemonMetrics {
        let roster = match roster {
            Some(roster) => roster,
            None => self.reconciler.detailed_roster().await,
        };
        let pokedex_total = self.catalog.total_count().await;
        summarize(&roster, pokedex_total)
    }
}

/// Most frequent type across all entries; the first type to reach the top
/// count wins ties.
fn favorite_type(roster: &[CapturedPokemon]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for kind in roster.iter().flat_map(|pokemon| pokemon.types.iter()) {
        let count = counts.entry(kind.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(kind.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for kind in first_seen {
        let count = counts[kind];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((kind, count));
        }
    }
    best.map(|(kind, _)| kind.to_string())
}

pub fn summarize(roster: &[CapturedPokemon], pokedex_total: u32) -> PokemonMetrics {
    let captured_count = roster.len();

    let pokedex_pct = if pokedex_total == 0 {
        0.0
    } else {
        (captured_count as f64 / pokedex_total as f64 * 100.0).min(100.0)
    };

    let avg_level = if roster.is_empty() {
        0
    } else {
        let total: u64 = roster.iter().map(|pokemon| u64::from(pokemon.level)).sum();
        (total as f64 / captured_count as f64).round() as u32
    };

    let mut strongest: Option<&CapturedPokemon> = None;
    for pokemon in roster {
        if strongest.map_or(true, |top| pokemon.atk > top.atk) {
            strongest = Some(pokemon);
        }
    }

    PokemonMetrics {
        captured_count,
        pokedex_total,
        pokedex_pct,
        avg_level,
        favorite_type: favorite_type(roster).unwrap_or_else(|| NO_DATA.to_string()),
        total_exp: roster
            .iter()
            .map(|pokemon| u64::from(pokemon.base_experience))
            .sum(),
        strongest: strongest.map(|pokemon| StrongestPokemon {
            id: pokemon.id,
            name: pokemon.name.clone(),
            atk: pokemon.atk,
        }),
    }
}
