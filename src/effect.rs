//! Effects - side effects declared by the reducer

use crate::state::{PageRequest, PokemonSummary};

/// Work the runtime performs on behalf of the reducer
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Fetch one page of summaries
    FetchPage { request: PageRequest },
    /// Fetch details for every summary concurrently, then report once
    FetchDetails {
        generation: u64,
        summaries: Vec<PokemonSummary>,
    },
}
