//! PokeAPI v2 client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::provider::{PokemonProvider, TransportError};
use crate::state::{PokemonDetail, PokemonSummary};

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 12;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: u32,
    /// Upper bound on requests in flight at once
    pub max_concurrent_requests: usize,
    /// Artificial delay before each page request, to make loading visible
    pub latency: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            latency: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    weight: u32,
    moves: Vec<PokemonMoveSlot>,
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonMoveSlot {
    #[serde(rename = "move")]
    move_info: NamedResource,
}

pub struct PokeApiClient {
    client: reqwest::Client,
    config: ApiConfig,
    permits: Arc<Semaphore>,
}

impl PokeApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Self {
            client: reqwest::Client::new(),
            config,
            permits,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn page_url(&self, page: u32) -> Result<String, TransportError> {
        if page == 0 {
            return Err(TransportError::InvalidPage(page));
        }
        let limit = self.config.page_size;
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or(TransportError::InvalidPage(page))?;
        Ok(format!(
            "{}/pokemon?offset={offset}&limit={limit}",
            self.base()
        ))
    }

    pub fn detail_url(&self, summary: &PokemonSummary) -> String {
        format!("{}/pokemon/{}", self.base(), summary.id)
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, TransportError> {
        let _permit = self.permits.acquire().await?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| TransportError::Decode(err.to_string()))
    }
}

impl Default for PokeApiClient {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

#[async_trait]
impl PokemonProvider for PokeApiClient {
    async fn fetch_page(&self, page: u32) -> Result<Vec<PokemonSummary>, TransportError> {
        let url = self.page_url(page)?;
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        let response: ListResponse = self.fetch_json(&url).await?;
        response
            .results
            .into_iter()
            .map(|entry| {
                let id = id_from_url(&entry.url).ok_or_else(|| {
                    TransportError::Decode(format!("no id in resource url {}", entry.url))
                })?;
                Ok(PokemonSummary::new(id, entry.name))
            })
            .collect()
    }

    async fn fetch_detail(
        &self,
        summary: &PokemonSummary,
    ) -> Result<PokemonDetail, TransportError> {
        let url = self.detail_url(summary);
        let response: PokemonResponse = self.fetch_json(&url).await?;
        Ok(detail_from_response(response))
    }
}

fn detail_from_response(response: PokemonResponse) -> PokemonDetail {
    PokemonDetail {
        image: pointer_string(&response.sprites, "/front_default"),
        weight: response.weight,
        primary_move: response
            .moves
            .into_iter()
            .next()
            .map(|slot| slot.move_info.name),
    }
}

/// `https://pokeapi.co/api/v2/pokemon/25/` -> 25
fn id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
