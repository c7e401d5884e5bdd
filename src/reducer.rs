//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::{LoadKind, LoadPhase, PokemonSummary, ViewState, FIRST_PAGE};

/// The reducer handles all state transitions
pub fn reducer(state: &mut ViewState, action: Action) -> DispatchResult<Effect> {
    match action {
        // ===== Intents =====
        Action::ListLoadInitial | Action::ListRetry => {
            state.phase = LoadPhase::Loading;
            state.current_page = FIRST_PAGE;
            state.replace_entries(Vec::new());
            let request = state.issue_request(FIRST_PAGE, LoadKind::Initial);
            DispatchResult::changed_with(Effect::FetchPage { request })
        }

        Action::ListLoadMore | Action::ListRetryPage => {
            // Nothing to extend yet, or another page is already on its way.
            if state.phase == LoadPhase::Idle || state.pending.is_some() {
                return DispatchResult::unchanged();
            }
            let request = state.issue_request(state.current_page + 1, LoadKind::Append);
            DispatchResult::changed_with(Effect::FetchPage { request })
        }

        Action::ListRefresh => {
            state.phase = LoadPhase::Refreshing;
            let request = state.issue_request(FIRST_PAGE, LoadKind::Refresh);
            DispatchResult::changed_with(Effect::FetchPage { request })
        }

        // ===== Page results =====
        Action::PageDidLoad { request, summaries } => {
            if !state.is_current(&request) {
                return DispatchResult::unchanged();
            }
            state.pending = None;
            state.phase = LoadPhase::Ready;

            let fresh = match request.kind {
                LoadKind::Initial | LoadKind::Refresh => {
                    state.current_page = FIRST_PAGE;
                    state.replace_entries(summaries)
                }
                LoadKind::Append if summaries.is_empty() => Vec::new(),
                LoadKind::Append => {
                    state.current_page = request.page;
                    state.append_entries(summaries)
                }
            };
            fan_out(state, fresh)
        }

        Action::PageDidError { request, error } => {
            if !state.is_current(&request) {
                return DispatchResult::unchanged();
            }
            state.pending = None;
            state.phase = LoadPhase::Failed(error);
            DispatchResult::changed()
        }

        // ===== Detail results =====
        Action::DetailsDidLoad {
            generation,
            details,
        } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            state.detail_batches = state.detail_batches.saturating_sub(1);
            state.merge_details(details);
            DispatchResult::changed()
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn fan_out(state: &mut ViewState, summaries: Vec<PokemonSummary>) -> DispatchResult<Effect> {
    if summaries.is_empty() {
        return DispatchResult::changed();
    }
    state.detail_batches += 1;
    DispatchResult::changed_with(Effect::FetchDetails {
        generation: state.generation,
        summaries,
    })
}
