use serde::{Deserialize, Serialize};

/// Shown as the favorite type when the roster carries no type data.
pub const NO_DATA: &str = "no-data";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrongestPokemon {
    pub id: u32,
    pub name: String,
    pub atk: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PokemonMetrics {
    pub captured_count: usize,
    pub pokedex_total: u32,
    /// Percentage of the catalog captured, never above 100.
    pub pokedex_pct: f64,
    pub avg_level: u32,
    pub favorite_type: String,
    pub total_exp: u64,
    pub strongest: Option<StrongestPokemon>,
}

impl Default for PokemonMetrics {
    fn default() -> Self {
        Self {
            captured_count: 0,
            pokedex_total: 0,
            pokedex_pct: 0.0,
            avg_level: 0,
            favorite_type: NO_DATA.to_string(),
            total_exp: 0,
            strongest: None,
        }
    }
}
