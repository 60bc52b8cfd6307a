//! Roster data models.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::{PokemonDetail, STAT_ATTACK, STAT_DEFENSE, STAT_SPEED};

/// (first id, last id, region, generation)
const GENERATION_RANGES: [(u32, u32, &str, &str); 8] = [
    (1, 151, "kanto", "1"),
    (152, 251, "johto", "2"),
    (252, 386, "hoenn", "3"),
    (387, 493, "sinnoh", "4"),
    (494, 649, "unova", "5"),
    (650, 721, "kalos", "6"),
    (722, 809, "alola", "7"),
    (810, 905, "galar", "8"),
];

pub fn region_for_id(id: u32) -> Option<&'static str> {
    GENERATION_RANGES
        .iter()
        .find(|(first, last, _, _)| (*first..=*last).contains(&id))
        .map(|(_, _, region, _)| *region)
}

pub fn generation_for_id(id: u32) -> Option<&'static str> {
    GENERATION_RANGES
        .iter()
        .find(|(first, last, _, _)| (*first..=*last).contains(&id))
        .map(|(_, _, _, generation)| *generation)
}

/// A creature the user has captured. `id` is the catalog identity and the
/// only de-duplication key inside a roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPokemon {
    pub id: u32,
    pub name: String,
    pub level: u32,
    /// ISO-8601, set once at capture time.
    pub captured_at: String,
    #[serde(default)]
    pub sprite: String,
    #[serde(default)]
    pub atk: u32,
    #[serde(default)]
    pub def: u32,
    #[serde(default)]
    pub spd: u32,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub base_experience: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
}

impl CapturedPokemon {
    pub fn captured_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.captured_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    /// Missing attack, types or sprite means the catalog detail was never merged in.
    pub fn needs_backfill(&self) -> bool {
        self.atk == 0 || self.types.is_empty() || self.sprite.is_empty()
    }

    /// Copy every catalog-derived field from `source`, leaving identity,
    /// `level` and `captured_at` alone.
    pub fn take_derived_fields(&mut self, source: &CapturedPokemon) {
        self.sprite = source.sprite.clone();
        self.atk = source.atk;
        self.def = source.def;
        self.spd = source.spd;
        self.types = source.types.clone();
        self.base_experience = source.base_experience;
        self.region = source.region.clone();
        self.generation = source.generation.clone();
    }
}

/// Everything needed to capture a creature; `captured_at` is stamped by the roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCapture {
    pub id: u32,
    pub name: String,
    pub level: u32,
    #[serde(default)]
    pub sprite: String,
    #[serde(default)]
    pub atk: u32,
    #[serde(default)]
    pub def: u32,
    #[serde(default)]
    pub spd: u32,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub base_experience: u32,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
}

impl NewCapture {
    /// Build a capture from a catalog entry picked in the browser. Without an
    /// explicit level one is rolled in `1..=100`.
    pub fn from_detail(detail: &PokemonDetail, level: Option<u32>) -> Self {
        let level = level.unwrap_or_else(|| rand::thread_rng().gen_range(1..=100));
        Self {
            id: detail.id,
            name: detail.name.clone(),
            level,
            sprite: detail.preferred_sprite().unwrap_or_default().to_string(),
            atk: detail.stat(STAT_ATTACK),
            def: detail.stat(STAT_DEFENSE),
            spd: detail.stat(STAT_SPEED),
            types: detail.type_names(),
            base_experience: detail.base_experience.unwrap_or(0),
            region: None,
            generation: None,
        }
    }

    pub fn into_captured(self, captured_at: DateTime<Utc>) -> CapturedPokemon {
        let region = self
            .region
            .or_else(|| region_for_id(self.id).map(String::from));
        let generation = self
            .generation
            .or_else(|| generation_for_id(self.id).map(String::from));

        CapturedPokemon {
            id: self.id,
            name: self.name,
            level: self.level,
            captured_at: captured_at.to_rfc3339(),
            sprite: self.sprite,
            atk: self.atk,
            def: self.def,
            spd: self.spd,
            types: self.types,
            base_experience: self.base_experience,
            region,
            generation,
        }
    }
}

/// Partial update for a roster entry; `id` and `captured_at` cannot be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterPatch {
    pub name: Option<String>,
    pub level: Option<u32>,
    pub sprite: Option<String>,
    pub atk: Option<u32>,
    pub def: Option<u32>,
    pub spd: Option<u32>,
    pub types: Option<Vec<String>>,
    pub base_experience: Option<u32>,
    pub region: Option<String>,
    pub generation: Option<String>,
}

impl RosterPatch {
    pub fn level(level: u32) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, pokemon: &mut CapturedPokemon) {
        if let Some(name) = &self.name {
            pokemon.name = name.clone();
        }
        if let Some(level) = self.level {
            pokemon.level = level;
        }
        if let Some(sprite) = &self.sprite {
            pokemon.sprite = sprite.clone();
        }
        if let Some(atk) = self.atk {
            pokemon.atk = atk;
        }
        if let Some(def) = self.def {
            pokemon.def = def;
        }
        if let Some(spd) = self.spd {
            pokemon.spd = spd;
        }
        if let Some(types) = &self.types {
            pokemon.types = types.clone();
        }
        if let Some(base_experience) = self.base_experience {
            pokemon.base_experience = base_experience;
        }
        if let Some(region) = &self.region {
            pokemon.region = Some(region.clone());
        }
        if let Some(generation) = &self.generation {
            pokemon.generation = Some(generation.clone());
        }
    }
}
