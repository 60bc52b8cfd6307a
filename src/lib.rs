pub mod catalog;
pub mod cli;
mod db;
pub mod metrics;
pub mod models;
pub mod recommendations;
pub mod reconcile;
pub mod roster;
pub mod settings;
pub mod storage;
mod utils;

#[cfg(test)]
mod test_support;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use catalog::{Catalog, PokeApiClient};
use cli::{Cli, Command};
use metrics::{MetricsEngine, PokemonMetrics};
use models::{CapturedPokemon, NewCapture};
use recommendations::{RecommendationEngine, RecommendationRefresher, RecommendedPokemon};
use reconcile::Reconciler;
use roster::{queries, Mutation, RosterStore, StorageStats};
use settings::Settings;
use storage::KvStore;

const SETTINGS_FILE: &str = "settings.json";
const DATABASE_FILE: &str = "pokedex.sqlite3";

/// Every component, wired once at start-up and shared by handle.
#[derive(Clone)]
pub struct PokedexCore {
    pub roster: RosterStore,
    pub reconciler: Reconciler,
    pub metrics: MetricsEngine,
    pub recommendations: RecommendationEngine,
}

impl PokedexCore {
    pub async fn assemble(settings: &Settings, kv: KvStore, catalog: Arc<dyn Catalog>) -> Self {
        let roster = RosterStore::load(kv.clone()).await;
        let reconciler = Reconciler::new(
            Arc::clone(&catalog),
            roster.clone(),
            settings.reconcile_concurrency,
        );
        let metrics = MetricsEngine::new(Arc::clone(&catalog), reconciler.clone());
        let recommendations = RecommendationEngine::new(
            catalog,
            kv,
            settings.recommendations.clone(),
            settings.max_species_id,
        );

        Self {
            roster,
            reconciler,
            metrics,
            recommendations,
        }
    }

    /// Reconcile the roster and gather everything the home screen shows.
    pub async fn status(&self) -> StatusReport {
        let roster = self.reconciler.detailed_roster().await;
        let metrics = self.metrics.compute(Some(roster.clone())).await;

        StatusReport {
            metrics,
            recent_captures: queries::recent_captures(&roster, queries::DEFAULT_RECENT_LIMIT),
            recommendations: self.recommendations.recommendations().await,
            storage: self.roster.storage_stats().await,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub metrics: PokemonMetrics,
    pub recent_captures: Vec<CapturedPokemon>,
    pub recommendations: Vec<RecommendedPokemon>,
    pub storage: StorageStats,
}

fn load_settings(data_dir: &std::path::Path) -> Settings {
    let path = data_dir.join(SETTINGS_FILE);
    let settings = Settings::load(&path);
    if !path.exists() {
        if let Err(err) = settings.save(&path) {
            warn!("Could not write default settings: {err:#}");
        }
    }
    settings.with_env_overrides()
}

async fn execute(command: Command, settings: Settings, data_dir: PathBuf) -> Result<()> {
    let kv = KvStore::open(data_dir.join(DATABASE_FILE));
    let catalog: Arc<dyn Catalog> = Arc::new(PokeApiClient::from_settings(&settings)?);
    let core = PokedexCore::assemble(&settings, kv, Arc::clone(&catalog)).await;

    let swept = core.recommendations.sweep_stale().await;
    if swept > 0 {
        info!("Removed {swept} expired cache documents");
    }

    match command {
        Command::Status => {
            let report = core.status().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Browse { limit } => {
            let summaries = catalog.list_summaries(limit).await;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Capture { id, level } => {
            let Some(detail) = catalog.detail(id).await else {
                bail!("pokemon {id} could not be fetched from the catalog");
            };
            match core.roster.add(NewCapture::from_detail(&detail, level)).await {
                Mutation::Applied => info!("Captured {} (#{id})", detail.name),
                Mutation::Unchanged => info!("{} (#{id}) is already captured", detail.name),
                Mutation::StorageFailed => bail!("capture of #{id} could not be saved"),
            }
        }
        Command::Release { id } => match core.roster.remove(id).await {
            Mutation::Applied => info!("Released #{id}"),
            Mutation::Unchanged => info!("#{id} was not captured"),
            Mutation::StorageFailed => bail!("release of #{id} could not be saved"),
        },
        Command::Export => println!("{}", core.roster.export_document()),
        Command::Import { path } => {
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let result = core.roster.import_document(&document).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                bail!(result.message);
            }
        }
        Command::Watch => {
            let refresher = RecommendationRefresher::new(
                core.recommendations.clone(),
                settings.recommendations.refresh_interval(),
            );
            let mut updates = refresher.subscribe();
            let cancel = CancellationToken::new();
            let handle = Arc::clone(&refresher).spawn(cancel.clone());

            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let batch = updates.borrow_and_update().clone();
                        println!("{}", serde_json::to_string(&batch.pokemon)?);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted; stopping recommendation refresher");
                        break;
                    }
                }
            }

            cancel.cancel();
            handle
                .await
                .context("recommendation refresher failed to join")?;
        }
    }

    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug || settings::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let command = cli.command();

    let data_dir = settings::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let settings = load_settings(&data_dir);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(execute(command, settings, data_dir))
}
