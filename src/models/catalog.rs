//! Catalog payloads as served by PokeAPI v2.
//!
//! Only the fields the roster needs are modelled; everything else in the
//! response is ignored by serde.

use serde::{Deserialize, Serialize};

pub const STAT_ATTACK: &str = "attack";
pub const STAT_DEFENSE: &str = "defense";
pub const STAT_SPEED: &str = "speed";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatEntry {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

/// `GET /pokemon/{id}`. Read-only; never mutated after fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

impl PokemonDetail {
    /// Base value of the named stat, 0 when the catalog omits it.
    pub fn stat(&self, name: &str) -> u32 {
        self.stats
            .iter()
            .find(|entry| entry.stat.name == name)
            .map(|entry| entry.base_stat)
            .unwrap_or(0)
    }

    /// Sum of every base stat (BST), the strength score used for ranking.
    pub fn base_stat_total(&self) -> u32 {
        self.stats.iter().map(|entry| entry.base_stat).sum()
    }

    /// Type names in slot order.
    pub fn type_names(&self) -> Vec<String> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|slot| slot.slot);
        slots.into_iter().map(|slot| slot.kind.name.clone()).collect()
    }

    /// Official artwork first, then the default front sprite. Empty URLs count as missing.
    pub fn preferred_sprite(&self) -> Option<&str> {
        let artwork = self
            .sprites
            .other
            .as_ref()
            .and_then(|other| other.official_artwork.as_ref())
            .and_then(|artwork| artwork.front_default.as_deref());

        artwork
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.sprites
                    .front_default
                    .as_deref()
                    .filter(|url| !url.is_empty())
            })
    }
}

/// `GET /pokemon?limit=n`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonList {
    pub count: u32,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

/// A listing row with its id recovered from the resource URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PokemonSummary {
    pub id: u32,
    pub name: String,
    pub url: String,
}

impl PokemonSummary {
    pub fn from_resource(resource: NamedResource) -> Option<Self> {
        let id = resource
            .url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())?;

        Some(Self {
            id,
            name: resource.name,
            url: resource.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BULBASAUR: &str = r#"{
        "id": 1,
        "name": "bulbasaur",
        "base_experience": 64,
        "height": 7,
        "sprites": {
            "front_default": "https://img/1.png",
            "other": { "official-artwork": { "front_default": "https://art/1.png" } }
        },
        "stats": [
            { "base_stat": 45, "stat": { "name": "hp", "url": "" } },
            { "base_stat": 49, "stat": { "name": "attack", "url": "" } },
            { "base_stat": 49, "stat": { "name": "defense", "url": "" } },
            { "base_stat": 65, "stat": { "name": "special-attack", "url": "" } },
            { "base_stat": 65, "stat": { "name": "special-defense", "url": "" } },
            { "base_stat": 45, "stat": { "name": "speed", "url": "" } }
        ],
        "types": [
            { "slot": 2, "type": { "name": "poison", "url": "" } },
            { "slot": 1, "type": { "name": "grass", "url": "" } }
        ]
    }"#;

    #[test]
    fn parses_detail_and_derives_fields() {
        let detail: PokemonDetail = serde_json::from_str(BULBASAUR).unwrap();

        assert_eq!(detail.stat(STAT_ATTACK), 49);
        assert_eq!(detail.stat("missing"), 0);
        assert_eq!(detail.base_stat_total(), 318);
        assert_eq!(detail.type_names(), vec!["grass".to_string(), "poison".to_string()]);
        assert_eq!(detail.preferred_sprite(), Some("https://art/1.png"));
        assert_eq!(detail.base_experience, Some(64));
    }

    #[test]
    fn sprite_falls_back_to_front_default() {
        let detail: PokemonDetail = serde_json::from_str(
            r#"{"id": 2, "name": "ivysaur", "base_experience": null,
                "sprites": {"front_default": "https://img/2.png", "other": {"official-artwork": {"front_default": null}}}}"#,
        )
        .unwrap();

        assert_eq!(detail.preferred_sprite(), Some("https://img/2.png"));
        assert_eq!(detail.base_experience, None);
        assert!(detail.stats.is_empty());
    }

    #[test]
    fn summary_id_comes_from_url() {
        let summary = PokemonSummary::from_resource(NamedResource {
            name: "pikachu".into(),
            url: "https://pokeapi.co/api/v2/pokemon/25/".into(),
        })
        .unwrap();
        assert_eq!(summary.id, 25);

        assert!(PokemonSummary::from_resource(NamedResource {
            name: "broken".into(),
            url: "https://pokeapi.co/api/v2/pokemon/".into(),
        })
        .is_none());
    }
}
