//! Data provider contract consumed by the coordinator

use async_trait::async_trait;

use crate::state::{PokemonDetail, PokemonSummary};

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("page numbers start at 1, got {0}")]
    InvalidPage(u32),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("response parse error: {0}")]
    Decode(String),
    #[error("request limiter closed")]
    LimiterClosed(#[from] tokio::sync::AcquireError),
}

/// Source of pages and per-item details. Calls must be idempotent so the
/// caller can retry them freely.
#[async_trait]
pub trait PokemonProvider: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Vec<PokemonSummary>, TransportError>;

    async fn fetch_detail(&self, summary: &PokemonSummary)
        -> Result<PokemonDetail, TransportError>;
}
