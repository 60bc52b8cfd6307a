pub mod catalog;
pub mod pokemon;

pub use catalog::{NamedResource, PokemonDetail, PokemonList, PokemonSummary, StatEntry, TypeSlot};
pub use pokemon::{generation_for_id, region_for_id, CapturedPokemon, NewCapture, RosterPatch};
