use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::Catalog;
use crate::models::{PokemonDetail, PokemonList, PokemonSummary};
use crate::settings::Settings;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

/// `Catalog` backed by the PokeAPI v2 HTTP service.
#[derive(Clone)]
pub struct PokeApiClient {
    client: Client,
    api_base: String,
    max_species_id: u32,
}

impl PokeApiClient {
    pub fn new(api_base: &str, timeout: Duration, max_species_id: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            max_species_id,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.api_base,
            settings.request_timeout(),
            settings.max_species_id,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn fetch_list(&self, limit: u32) -> Result<PokemonList> {
        let response = self
            .client
            .get(self.url(&format!("pokemon?limit={limit}")))
            .send()
            .await
            .context("catalog listing request failed")?
            .error_for_status()
            .context("catalog listing returned an error status")?;

        response
            .json::<PokemonList>()
            .await
            .context("catalog listing payload was malformed")
    }

    async fn fetch_detail(&self, id: u32) -> Result<Option<PokemonDetail>> {
        let url = self.url(&format!("pokemon/{id}"));
        log_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("detail request for {id} failed"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "detail request for {id} returned {}",
                response.status()
            ));
        }

        let detail = response
            .json::<PokemonDetail>()
            .await
            .with_context(|| format!("detail payload for {id} was malformed"))?;
        Ok(Some(detail))
    }
}

#[async_trait]
impl Catalog for PokeApiClient {
    async fn total_count(&self) -> u32 {
        match self.fetch_list(1).await {
            Ok(list) => list.count,
            Err(err) => {
                log_error!("Failed to fetch catalog total: {err:#}");
                0
            }
        }
    }

    async fn detail(&self, id: u32) -> Option<PokemonDetail> {
        if id < 1 || id > self.max_species_id {
            log_warn!(
                "Catalog id {} outside the valid range 1..={}",
                id,
                self.max_species_id
            );
            return None;
        }

        match self.fetch_detail(id).await {
            Ok(Some(detail)) => Some(detail),
            Ok(None) => {
                log_warn!("Catalog entry {} not found", id);
                None
            }
            Err(err) => {
                log_error!("Failed to fetch catalog entry {}: {err:#}", id);
                None
            }
        }
    }

    async fn list_summaries(&self, limit: u32) -> Vec<PokemonSummary> {
        match self.fetch_list(limit).await {
            Ok(list) => list
                .results
                .into_iter()
                .filter_map(PokemonSummary::from_resource)
                .collect(),
            Err(err) => {
                log_error!("Failed to list catalog entries: {err:#}");
                Vec::new()
            }
        }
    }
}
