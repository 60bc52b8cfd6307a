//! Read-only views over a roster snapshot. Nothing here touches storage.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::CapturedPokemon;

pub const DEFAULT_RECENT_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Level,
    CapturedAt,
    Atk,
    Def,
    Spd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Pokedex page filter. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterFilter {
    pub search: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub region: String,
    pub generation: String,
}

/// Most recently captured first; entries with unparseable timestamps go last.
pub fn recent_captures(roster: &[CapturedPokemon], limit: usize) -> Vec<CapturedPokemon> {
    let mut recent = roster.to_vec();
    recent.sort_by(|a, b| match (a.captured_at_time(), b.captured_at_time()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    recent.truncate(limit);
    recent
}

fn matches_query(pokemon: &CapturedPokemon, query: &str) -> bool {
    pokemon.name.to_lowercase().contains(query)
        || pokemon
            .types
            .iter()
            .any(|kind| kind.to_lowercase().contains(query))
}

pub fn search(roster: &[CapturedPokemon], query: &str) -> Vec<CapturedPokemon> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return roster.to_vec();
    }

    roster
        .iter()
        .filter(|pokemon| matches_query(pokemon, &query))
        .cloned()
        .collect()
}

pub fn sorted(roster: &[CapturedPokemon], field: SortField, order: SortOrder) -> Vec<CapturedPokemon> {
    let mut sorted = roster.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = match field {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Level => a.level.cmp(&b.level),
            SortField::CapturedAt => a.captured_at_time().cmp(&b.captured_at_time()),
            SortField::Atk => a.atk.cmp(&b.atk),
            SortField::Def => a.def.cmp(&b.def),
            SortField::Spd => a.spd.cmp(&b.spd),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}

impl RosterFilter {
    pub fn matches(&self, pokemon: &CapturedPokemon) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let in_region = pokemon
                .region
                .as_deref()
                .map(|region| region.to_lowercase().contains(&search))
                .unwrap_or(false);
            if !matches_query(pokemon, &search) && !in_region {
                return false;
            }
        }

        if !self.kind.is_empty()
            && !pokemon
                .types
                .iter()
                .any(|kind| kind.eq_ignore_ascii_case(&self.kind))
        {
            return false;
        }
        if !self.region.is_empty()
            && !pokemon
                .region
                .as_deref()
                .is_some_and(|region| region.eq_ignore_ascii_case(&self.region))
        {
            return false;
        }
        if !self.generation.is_empty()
            && pokemon.generation.as_deref() != Some(self.generation.as_str())
        {
            return false;
        }
        true
    }
}

pub fn filter(roster: &[CapturedPokemon], criteria: &RosterFilter) -> Vec<CapturedPokemon> {
    roster
        .iter()
        .filter(|pokemon| criteria.matches(pokemon))
        .cloned()
        .collect()
}
