use rand::{seq::SliceRandom, Rng};

use super::types::{RankedPokemon, RecommendedPokemon};

/// Well-known legendaries, served when the catalog cannot be reached.
pub const LEGENDARY_IDS: [u32; 8] = [150, 249, 250, 382, 383, 384, 483, 484];

const ARTWORK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// Two distinct legendaries with randomized stats in a believable range.
pub fn fallback_pair() -> Vec<RecommendedPokemon> {
    let mut rng = rand::thread_rng();
    let ids: Vec<u32> = LEGENDARY_IDS.choose_multiple(&mut rng, 2).copied().collect();

    ids.into_iter()
        .map(|id| {
            RankedPokemon {
                id,
                name: format!("pokemon-{id}"),
                sprite: format!("{ARTWORK_BASE}/{id}.png"),
                atk: rng.gen_range(120..170),
                def: rng.gen_range(100..150),
                spd: rng.gen_range(110..160),
                types: vec!["dragon".to_string()],
                base_experience: 350,
                bst: rng.gen_range(600..700),
            }
            .recommend(rng.gen_range(70..100))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_two_distinct_legendaries_in_range() {
        for _ in 0..200 {
            let pair = fallback_pair();
            assert_eq!(pair.len(), 2);
            assert_ne!(pair[0].pokemon.id, pair[1].pokemon.id);

            for entry in &pair {
                let pokemon = &entry.pokemon;
                assert!(LEGENDARY_IDS.contains(&pokemon.id));
                assert!((70..=99).contains(&pokemon.level));
                assert!((120..=169).contains(&pokemon.atk));
                assert!((100..=149).contains(&pokemon.def));
                assert!((110..=159).contains(&pokemon.spd));
                assert!((600..=699).contains(&entry.bst));
                assert!(pokemon.captured_at.is_empty());
            }
        }
    }
}
