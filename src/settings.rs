use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationSettings {
    pub ttl_hours: u64,
    pub sample_size: usize,
    pub fetch_concurrency: usize,
    pub keep_top: usize,
    pub refresh_interval_secs: u64,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 12,
            sample_size: 350,
            fetch_concurrency: 12,
            keep_top: 100,
            refresh_interval_secs: 10 * 60,
        }
    }
}

impl RecommendationSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 60 * 60)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_base: String,
    pub request_timeout_secs: u64,
    /// Highest id the detail endpoint is queried for.
    pub max_species_id: u32,
    pub reconcile_concurrency: usize,
    pub recommendations: RecommendationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            request_timeout_secs: 10,
            max_species_id: 1010,
            reconcile_concurrency: 8,
            recommendations: RecommendationSettings::default(),
        }
    }
}

impl Settings {
    /// Read `settings.json`; a missing or malformed file yields defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))
            .and_then(|contents| {
                serde_json::from_str(&contents)
                    .with_context(|| format!("Malformed settings in {}", path.display()))
            });

        match parsed {
            Ok(settings) => settings,
            Err(err) => {
                warn!("{err:#}; falling back to default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// `POKEDEX_API_BASE` overrides the catalog URL.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(api_base) = std::env::var("POKEDEX_API_BASE") {
            if !api_base.trim().is_empty() {
                self.api_base = api_base.trim().to_string();
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// `POKEDEX_DATA_DIR`, else `<platform data dir>/pokedex`, else `./pokedex-data`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("POKEDEX_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join("pokedex"))
        .unwrap_or_else(|| PathBuf::from("pokedex-data"))
}

pub fn debug_enabled() -> bool {
    std::env::var("POKEDEX_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
