//! Backfill catalog-derived fields (stats, types, sprite) onto roster entries
//! captured before that detail was available.

use std::{collections::HashMap, sync::Arc};

use crate::catalog::{fetch_details_batch, Catalog};
use crate::models::{
    catalog::{STAT_ATTACK, STAT_DEFENSE, STAT_SPEED},
    generation_for_id, region_for_id, CapturedPokemon, PokemonDetail,
};
use crate::roster::{Mutation, RosterStore};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DEFAULT_RECONCILE_CONCURRENCY: usize = 8;

fn non_zero_or(fetched: u32, prior: u32) -> u32 {
    if fetched > 0 {
        fetched
    } else {
        prior
    }
}

/// Fold a fetched detail into a stored entry. Fetched values win unless they
/// are zero or empty; identity, `level` and `captured_at` always come from `prior`.
pub fn merge_detail(prior: &CapturedPokemon, detail: &PokemonDetail) -> CapturedPokemon {
    let sprite = detail
        .preferred_sprite()
        .map(str::to_string)
        .unwrap_or_else(|| prior.sprite.clone());
    let types = detail.type_names();

    CapturedPokemon {
        sprite,
        atk: non_zero_or(detail.stat(STAT_ATTACK), prior.atk),
        def: non_zero_or(detail.stat(STAT_DEFENSE), prior.def),
        spd: non_zero_or(detail.stat(STAT_SPEED), prior.spd),
        types: if types.is_empty() {
            prior.types.clone()
        } else {
            types
        },
        base_experience: non_zero_or(detail.base_experience.unwrap_or(0), prior.base_experience),
        region: prior
            .region
            .clone()
            .or_else(|| region_for_id(prior.id).map(String::from)),
        generation: prior
            .generation
            .clone()
            .or_else(|| generation_for_id(prior.id).map(String::from)),
        ..prior.clone()
    }
}

#[derive(Clone)]
pub struct Reconciler {
    catalog: Arc<dyn Catalog>,
    roster: RosterStore,
    concurrency: usize,
}

impl Reconciler {
    pub fn new(catalog: Arc<dyn Catalog>, roster: RosterStore, concurrency: usize) -> Self {
        Self {
            catalog,
            roster,
            concurrency,
        }
    }

    /// The live roster with missing detail filled in.
    pub async fn detailed_roster(&self) -> Vec<CapturedPokemon> {
        self.reconcile(self.roster.snapshot()).await
    }

    /// Returns `entries` in their original order. Entries whose fetch fails
    /// are returned untouched; the merged ones are written back to the roster.
    pub async fn reconcile(&self, entries: Vec<CapturedPokemon>) -> Vec<CapturedPokemon> {
        let pending: Vec<u32> = entries
            .iter()
            .filter(|pokemon| pokemon.needs_backfill())
            .map(|pokemon| pokemon.id)
            .collect();

        if pending.is_empty() {
            return entries;
        }

        let fetched: HashMap<u32, PokemonDetail> =
            fetch_details_batch(self.catalog.as_ref(), &pending, self.concurrency)
                .await
                .into_iter()
                .filter_map(|(id, detail)| detail.map(|detail| (id, detail)))
                .collect();

        let missed = pending.len() - fetched.len();
        if missed > 0 {
            log_warn!("{} roster entries kept their stored fields; catalog fetch failed", missed);
        }

        let mut updated = Vec::with_capacity(fetched.len());
        let merged: Vec<CapturedPokemon> = entries
            .into_iter()
            .map(|pokemon| match fetched.get(&pokemon.id) {
                Some(detail) if pokemon.needs_backfill() => {
                    let merged = merge_detail(&pokemon, detail);
                    updated.push(merged.clone());
                    merged
                }
                _ => pokemon,
            })
            .collect();

        match self.roster.apply_backfill(&updated).await {
            Mutation::Applied => {
                log_info!("Backfilled {} roster entries", updated.len());
            }
            Mutation::Unchanged => {}
            Mutation::StorageFailed => {
                log_warn!("Backfilled roster could not be saved; it will be refetched next time");
            }
        }

        merged
    }
}
