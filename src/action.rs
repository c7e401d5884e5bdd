//! Actions: caller intents plus async results fed back by the runtime

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{DetailOutcome, PageRequest, PokemonSummary};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    // ===== List category (intents) =====
    /// Intent: load page 1 from scratch
    #[action(category = "list")]
    ListLoadInitial,

    /// Intent: append the page after the current one
    #[action(category = "list")]
    ListLoadMore,

    /// Intent: reload page 1 while keeping the current entries visible
    #[action(category = "list")]
    ListRefresh,

    /// Intent: retry after a failed full load
    #[action(category = "list")]
    ListRetry,

    /// Intent: retry the page that failed to append
    #[action(category = "list")]
    ListRetryPage,

    // ===== Page results =====
    PageDidLoad {
        request: PageRequest,
        summaries: Vec<PokemonSummary>,
    },

    PageDidError {
        request: PageRequest,
        error: String,
    },

    // ===== Detail results =====
    /// One fan-out batch finished; failures are carried as `None`
    DetailsDidLoad {
        generation: u64,
        details: Vec<DetailOutcome>,
    },

    /// Stop the coordinator
    Quit,
}

impl Action {
    /// Intents come from callers; everything else is produced by the runtime
    pub fn is_intent(&self) -> bool {
        matches!(
            self,
            Action::ListLoadInitial
                | Action::ListLoadMore
                | Action::ListRefresh
                | Action::ListRetry
                | Action::ListRetryPage
        )
    }
}
