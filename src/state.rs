//! View state - single source of truth for the paginated list

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// First page number understood by the data provider
pub const FIRST_PAGE: u32 = 1;

/// One row of a fetched page
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PokemonSummary {
    pub id: u32,
    pub name: String,
}

impl PokemonSummary {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Secondary data fetched per summary
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonDetail {
    pub image: Option<String>,
    pub weight: u32,
    pub primary_move: Option<String>,
}

/// A summary paired with its detail once the detail fetch resolves
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonEntry {
    pub summary: PokemonSummary,
    pub detail: Option<PokemonDetail>,
}

impl PokemonEntry {
    pub fn id(&self) -> u32 {
        self.summary.id
    }
}

impl From<PokemonSummary> for PokemonEntry {
    fn from(summary: PokemonSummary) -> Self {
        Self {
            summary,
            detail: None,
        }
    }
}

/// Coarse status of the most recent load-affecting operation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LoadPhase {
    #[default]
    Idle,
    /// Full load in flight, nothing trusted yet
    Loading,
    /// Reload in flight, stale entries still shown
    Refreshing,
    Ready,
    Failed(String),
}

impl LoadPhase {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadPhase::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadPhase::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// What a page request does with its result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LoadKind {
    /// Replace the list (loadInitial / retry)
    Initial,
    /// Append the next page (loadMore / retryPage)
    Append,
    /// Replace the list while keeping old entries visible meanwhile
    Refresh,
}

/// A page request in flight. The ticket identifies the request; results
/// carrying any other ticket are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageRequest {
    pub ticket: u64,
    pub page: u32,
    pub kind: LoadKind,
}

/// Outcome of one detail fetch inside a fan-out batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DetailOutcome {
    pub id: u32,
    /// `None` when the fetch failed
    pub detail: Option<PokemonDetail>,
}

/// Everything an observer needs to render the list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ViewState {
    pub entries: Vec<PokemonEntry>,
    pub phase: LoadPhase,

    /// Last page that loaded successfully with at least one entry
    pub current_page: u32,

    /// Identifies the current entry list; bumped on wholesale replacement
    pub generation: u64,

    /// Last ticket handed out to a page request
    pub last_ticket: u64,

    pub pending: Option<PageRequest>,

    /// Detail batches outstanding for the current generation
    pub detail_batches: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            phase: LoadPhase::Idle,
            current_page: FIRST_PAGE,
            generation: 0,
            last_ticket: 0,
            pending: None,
            detail_batches: 0,
        }
    }
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == LoadPhase::Refreshing
    }

    pub fn is_ready(&self) -> bool {
        self.phase == LoadPhase::Ready
    }

    /// No page request and no detail batch outstanding
    pub fn is_settled(&self) -> bool {
        self.pending.is_none() && self.detail_batches == 0
    }

    /// Failure with nothing to show: the UI offers "retry from scratch"
    pub fn needs_full_retry(&self) -> bool {
        self.phase.is_failed() && self.entries.is_empty()
    }

    pub fn entry(&self, id: u32) -> Option<&PokemonEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entry(id).is_some()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.entries.iter().map(PokemonEntry::id).collect()
    }

    pub fn loaded_details(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.detail.is_some())
            .count()
    }

    /// Hand out the next page request ticket and mark it pending
    pub fn issue_request(&mut self, page: u32, kind: LoadKind) -> PageRequest {
        self.last_ticket += 1;
        let request = PageRequest {
            ticket: self.last_ticket,
            page,
            kind,
        };
        self.pending = Some(request);
        request
    }

    /// True when `request` is the one currently pending
    pub fn is_current(&self, request: &PageRequest) -> bool {
        self.pending.as_ref() == Some(request)
    }

    /// Drop the list and start a new generation
    pub fn replace_entries(&mut self, summaries: Vec<PokemonSummary>) -> Vec<PokemonSummary> {
        self.generation += 1;
        self.detail_batches = 0;
        self.entries.clear();
        self.append_entries(summaries)
    }

    /// Append summaries whose ids are not present yet; returns the ones added
    pub fn append_entries(&mut self, summaries: Vec<PokemonSummary>) -> Vec<PokemonSummary> {
        let mut seen: HashSet<u32> = self.entries.iter().map(PokemonEntry::id).collect();
        let added: Vec<PokemonSummary> = summaries
            .into_iter()
            .filter(|summary| seen.insert(summary.id))
            .collect();
        self.entries
            .extend(added.iter().cloned().map(PokemonEntry::from));
        added
    }

    /// Attach fetched details to live entries. Returns how many were applied.
    pub fn merge_details(&mut self, details: Vec<DetailOutcome>) -> usize {
        let mut applied = 0;
        for outcome in details {
            let Some(detail) = outcome.detail else {
                continue;
            };
            if let Some(entry) = self
                .entries
                .iter_mut()
                .find(|entry| entry.id() == outcome.id)
            {
                entry.detail = Some(detail);
                applied += 1;
            }
        }
        applied
    }
}
