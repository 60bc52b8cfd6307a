use serde::{Deserialize, Serialize};

use crate::models::{
    catalog::{STAT_ATTACK, STAT_DEFENSE, STAT_SPEED},
    generation_for_id, region_for_id, CapturedPokemon, PokemonDetail,
};

/// A catalog entry as stored in the recommendation cache, scored by BST.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedPokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprite: String,
    pub atk: u32,
    pub def: u32,
    pub spd: u32,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub base_experience: u32,
    pub bst: u32,
}

impl RankedPokemon {
    pub fn from_detail(detail: &PokemonDetail) -> Self {
        Self {
            id: detail.id,
            name: detail.name.clone(),
            sprite: detail.preferred_sprite().unwrap_or_default().to_string(),
            atk: detail.stat(STAT_ATTACK),
            def: detail.stat(STAT_DEFENSE),
            spd: detail.stat(STAT_SPEED),
            types: detail.type_names(),
            base_experience: detail.base_experience.unwrap_or(0),
            bst: detail.base_stat_total(),
        }
    }

    pub fn recommend(&self, level: u32) -> RecommendedPokemon {
        RecommendedPokemon {
            pokemon: CapturedPokemon {
                id: self.id,
                name: self.name.clone(),
                level,
                captured_at: String::new(),
                sprite: self.sprite.clone(),
                atk: self.atk,
                def: self.def,
                spd: self.spd,
                types: self.types.clone(),
                base_experience: self.base_experience,
                region: region_for_id(self.id).map(String::from),
                generation: generation_for_id(self.id).map(String::from),
            },
            bst: self.bst,
        }
    }
}

/// A suggested capture: a not-yet-captured entry (empty `capturedAt`) plus
/// its strength score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedPokemon {
    #[serde(flatten)]
    pub pokemon: CapturedPokemon,
    pub bst: u32,
}
