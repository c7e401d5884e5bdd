//! State machine tests driven through the store and its test harness
//!
//! Page requests are numbered by ticket in the order intents are
//! dispatched, so results can be scripted without reading them back.

use pokelist::{
    action::Action,
    effect::Effect,
    reducer::reducer,
    state::{
        DetailOutcome, LoadKind, LoadPhase, PageRequest, PokemonDetail, PokemonSummary, ViewState,
    },
};
use pretty_assertions::assert_eq;
use tui_dispatch::testing::*;
use tui_dispatch::{assert_emitted, assert_not_emitted, EffectStore};

fn mon(id: u32, name: &str) -> PokemonSummary {
    PokemonSummary::new(id, name)
}

fn page(ids: &[u32]) -> Vec<PokemonSummary> {
    ids.iter().map(|id| mon(*id, &format!("mon-{id}"))).collect()
}

fn request(ticket: u64, page: u32, kind: LoadKind) -> PageRequest {
    PageRequest { ticket, page, kind }
}

fn weight(weight: u32) -> PokemonDetail {
    PokemonDetail {
        weight,
        ..Default::default()
    }
}

/// Store with page 1 loaded (ticket 1, generation 2) and no details yet
fn loaded_store(ids: &[u32]) -> EffectStore<ViewState, Action, Effect> {
    let mut store = EffectStore::new(ViewState::default(), reducer);
    store.dispatch(Action::ListLoadInitial);
    store.dispatch(Action::PageDidLoad {
        request: request(1, 1, LoadKind::Initial),
        summaries: page(ids),
    });
    store
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_initial_load_then_detail_merge() {
    let mut harness = EffectStoreTestHarness::new(ViewState::default(), reducer);

    harness.dispatch_collect(Action::ListLoadInitial);
    harness.assert_state(|s| s.phase == LoadPhase::Loading);
    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(
            e,
            Effect::FetchPage {
                request: PageRequest {
                    ticket: 1,
                    page: 1,
                    kind: LoadKind::Initial
                }
            }
        )
    });

    harness.dispatch_collect(Action::PageDidLoad {
        request: request(1, 1, LoadKind::Initial),
        summaries: vec![mon(1, "Bulbasaur")],
    });
    harness.assert_state(|s| s.phase == LoadPhase::Ready);

    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(e, Effect::FetchDetails { summaries, .. } if summaries == &vec![mon(1, "Bulbasaur")])
    });

    harness.complete_action(Action::DetailsDidLoad {
        generation: 2,
        details: vec![DetailOutcome {
            id: 1,
            detail: Some(weight(69)),
        }],
    });
    let (changed, total) = harness.process_emitted();
    assert_eq!((changed, total), (1, 1));

    harness.assert_state(|s| s.phase == LoadPhase::Ready);
    harness.assert_state(|s| s.entries.len() == 1);
    harness.assert_state(|s| {
        s.entries[0].summary == mon(1, "Bulbasaur")
            && s.entries[0].detail.as_ref().map(|d| d.weight) == Some(69)
    });
    harness.assert_state(|s| s.is_settled());
}

#[test]
fn test_initial_load_failure() {
    let mut harness = EffectStoreTestHarness::new(ViewState::default(), reducer);

    harness.dispatch_collect(Action::ListLoadInitial);
    harness.complete_action(Action::PageDidError {
        request: request(1, 1, LoadKind::Initial),
        error: "network down".into(),
    });
    harness.process_emitted();

    harness.assert_state(|s| s.phase == LoadPhase::Failed("network down".into()));
    harness.assert_state(|s| s.entries.is_empty());
    harness.assert_state(|s| s.needs_full_retry());
    harness.drain_effects().effects_none_match(|e| matches!(e, Effect::FetchDetails { .. }));
}

#[test]
fn test_load_more_merges_by_id() {
    let mut store = loaded_store(&[1, 2]);

    let result = store.dispatch(Action::ListLoadMore);
    assert_eq!(
        result.effects,
        vec![Effect::FetchPage {
            request: request(2, 2, LoadKind::Append)
        }]
    );

    let result = store.dispatch(Action::PageDidLoad {
        request: request(2, 2, LoadKind::Append),
        summaries: page(&[2, 3]),
    });

    assert_eq!(store.state().ids(), vec![1, 2, 3]);
    assert_eq!(store.state().current_page, 2);
    assert_eq!(
        result.effects,
        vec![Effect::FetchDetails {
            generation: 2,
            summaries: page(&[3]),
        }]
    );
}

#[test]
fn test_refresh_discards_stale_detail_batch() {
    let mut store = loaded_store(&[1]);
    assert_eq!(store.state().generation, 2);

    store.dispatch(Action::ListRefresh);
    assert!(store.state().is_refreshing());
    assert_eq!(store.state().ids(), vec![1], "old entries stay visible");

    store.dispatch(Action::PageDidLoad {
        request: request(2, 1, LoadKind::Refresh),
        summaries: page(&[1]),
    });
    assert_eq!(store.state().generation, 3);

    // The batch issued by the initial load resolves only now.
    let result = store.dispatch(Action::DetailsDidLoad {
        generation: 2,
        details: vec![DetailOutcome {
            id: 1,
            detail: Some(weight(1)),
        }],
    });
    assert!(!result.changed);
    assert_eq!(store.state().entry(1).and_then(|e| e.detail.clone()), None);

    store.dispatch(Action::DetailsDidLoad {
        generation: 3,
        details: vec![DetailOutcome {
            id: 1,
            detail: Some(weight(69)),
        }],
    });
    assert_eq!(
        store.state().entry(1).and_then(|e| e.detail.clone()),
        Some(weight(69))
    );
    assert!(store.state().is_settled());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_successive_pages_never_duplicate_ids() {
    let pages: [&[u32]; 5] = [&[1, 2, 3], &[3, 4, 5], &[5, 1, 6], &[7, 7, 8], &[2, 9]];
    let mut store = loaded_store(pages[0]);
    let mut ticket = 1;

    for (index, ids) in pages.iter().enumerate().skip(1) {
        let before = store.state().ids();
        store.dispatch(Action::ListLoadMore);
        ticket += 1;
        store.dispatch(Action::PageDidLoad {
            request: request(ticket, index as u32 + 1, LoadKind::Append),
            summaries: page(ids),
        });

        let after = store.state().ids();
        let mut unique = after.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), after.len(), "duplicate ids in {after:?}");
        assert_eq!(&after[..before.len()], &before[..], "existing entries moved");
    }

    assert_eq!(store.state().ids(), vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(store.state().current_page, 5);
}

#[test]
fn test_failed_load_more_leaves_list_and_page_untouched() {
    let mut store = loaded_store(&[1, 2]);
    store.dispatch(Action::DetailsDidLoad {
        generation: 2,
        details: vec![DetailOutcome {
            id: 2,
            detail: Some(weight(130)),
        }],
    });
    let entries_before = store.state().entries.clone();
    let page_before = store.state().current_page;

    store.dispatch(Action::ListLoadMore);
    store.dispatch(Action::PageDidError {
        request: request(2, 2, LoadKind::Append),
        error: "timeout".into(),
    });

    assert_eq!(store.state().entries, entries_before);
    assert_eq!(store.state().current_page, page_before);
    assert_eq!(store.state().phase, LoadPhase::Failed("timeout".into()));
    assert!(!store.state().needs_full_retry());
}

#[test]
fn test_retry_page_requests_the_same_page() {
    let mut store = loaded_store(&[1]);
    store.dispatch(Action::ListLoadMore);
    store.dispatch(Action::PageDidError {
        request: request(2, 2, LoadKind::Append),
        error: "timeout".into(),
    });

    let result = store.dispatch(Action::ListRetryPage);
    assert_eq!(
        result.effects,
        vec![Effect::FetchPage {
            request: request(3, 2, LoadKind::Append)
        }]
    );

    store.dispatch(Action::PageDidLoad {
        request: request(3, 2, LoadKind::Append),
        summaries: page(&[2]),
    });
    assert_eq!(store.state().phase, LoadPhase::Ready);
    assert_eq!(store.state().current_page, 2);
    assert_eq!(store.state().ids(), vec![1, 2]);
}

#[test]
fn test_refresh_replaces_list_wholesale() {
    let mut store = loaded_store(&[1, 2]);
    store.dispatch(Action::ListLoadMore);
    store.dispatch(Action::PageDidLoad {
        request: request(2, 2, LoadKind::Append),
        summaries: page(&[3, 4]),
    });
    store.dispatch(Action::DetailsDidLoad {
        generation: 2,
        details: vec![DetailOutcome {
            id: 1,
            detail: Some(weight(69)),
        }],
    });

    let result = store.dispatch(Action::ListRefresh);
    assert_eq!(
        result.effects,
        vec![Effect::FetchPage {
            request: request(3, 1, LoadKind::Refresh)
        }]
    );
    let result = store.dispatch(Action::PageDidLoad {
        request: request(3, 1, LoadKind::Refresh),
        summaries: page(&[1, 5]),
    });

    assert_eq!(store.state().phase, LoadPhase::Ready);
    assert_eq!(store.state().ids(), vec![1, 5]);
    assert_eq!(store.state().current_page, 1);
    assert_eq!(store.state().loaded_details(), 0, "details are refetched");
    assert_eq!(
        result.effects,
        vec![Effect::FetchDetails {
            generation: 3,
            summaries: page(&[1, 5]),
        }]
    );
}

#[test]
fn test_failed_refresh_keeps_previous_entries() {
    let mut store = loaded_store(&[1, 2]);
    let before = store.state().entries.clone();

    store.dispatch(Action::ListRefresh);
    store.dispatch(Action::PageDidError {
        request: request(2, 1, LoadKind::Refresh),
        error: "offline".into(),
    });

    assert_eq!(store.state().entries, before);
    assert_eq!(store.state().phase, LoadPhase::Failed("offline".into()));
    assert_eq!(store.state().generation, 2);
}

#[test]
fn test_detail_failure_only_affects_its_entry() {
    let mut store = loaded_store(&[1, 2, 3]);
    let phase_before = store.state().phase.clone();

    store.dispatch(Action::DetailsDidLoad {
        generation: 2,
        details: vec![
            DetailOutcome {
                id: 1,
                detail: Some(weight(69)),
            },
            DetailOutcome { id: 2, detail: None },
            DetailOutcome {
                id: 3,
                detail: Some(weight(1000)),
            },
        ],
    });

    let state = store.state();
    assert_eq!(state.phase, phase_before);
    assert_eq!(state.ids(), vec![1, 2, 3]);
    assert_eq!(state.entry(1).and_then(|e| e.detail.clone()), Some(weight(69)));
    assert_eq!(state.entry(2).and_then(|e| e.detail.clone()), None);
    assert_eq!(state.entry(3).and_then(|e| e.detail.clone()), Some(weight(1000)));
}

#[test]
fn test_empty_first_page_is_ready_and_empty() {
    let mut harness = EffectStoreTestHarness::new(ViewState::default(), reducer);

    harness.dispatch_collect(Action::ListLoadInitial);
    harness.drain_effects();
    harness.complete_action(Action::PageDidLoad {
        request: request(1, 1, LoadKind::Initial),
        summaries: Vec::new(),
    });
    harness.process_emitted();

    harness.assert_state(|s| s.phase == LoadPhase::Ready && s.entries.is_empty());
    harness.assert_state(|s| s.current_page == 1 && s.is_settled());
    harness.drain_effects().effects_empty();
}

// ============================================================================
// Overlapping operations
// ============================================================================

#[test]
fn test_refresh_during_initial_load_wins() {
    let mut store = EffectStore::new(ViewState::default(), reducer);
    store.dispatch(Action::ListLoadInitial);
    store.dispatch(Action::ListRefresh);

    // Refresh answers first, then the superseded initial load.
    store.dispatch(Action::PageDidLoad {
        request: request(2, 1, LoadKind::Refresh),
        summaries: page(&[10, 11]),
    });
    let late = store.dispatch(Action::PageDidLoad {
        request: request(1, 1, LoadKind::Initial),
        summaries: page(&[1, 2]),
    });

    assert!(!late.changed);
    assert!(late.effects.is_empty());
    assert_eq!(store.state().ids(), vec![10, 11]);
    assert_eq!(store.state().phase, LoadPhase::Ready);
}

#[test]
fn test_superseded_failure_is_ignored() {
    let mut store = EffectStore::new(ViewState::default(), reducer);
    store.dispatch(Action::ListLoadInitial);
    store.dispatch(Action::ListRetry);

    store.dispatch(Action::PageDidError {
        request: request(1, 1, LoadKind::Initial),
        error: "old failure".into(),
    });

    assert_eq!(store.state().phase, LoadPhase::Loading);
    assert_eq!(
        store.state().pending,
        Some(request(2, 1, LoadKind::Initial))
    );
}

#[test]
fn test_initial_load_supersedes_pending_append() {
    let mut store = loaded_store(&[1]);
    store.dispatch(Action::ListLoadMore);
    store.dispatch(Action::ListLoadInitial);

    let late = store.dispatch(Action::PageDidLoad {
        request: request(2, 2, LoadKind::Append),
        summaries: page(&[2]),
    });

    assert!(!late.changed);
    assert!(store.state().entries.is_empty());
    assert!(store.state().is_loading());
}

// ============================================================================
// Actions
// ============================================================================

#[test]
fn test_action_categories() {
    let did_load = Action::PageDidLoad {
        request: request(1, 1, LoadKind::Initial),
        summaries: Vec::new(),
    };
    let intents = [
        Action::ListLoadInitial,
        Action::ListLoadMore,
        Action::ListRefresh,
        Action::ListRetry,
        Action::ListRetryPage,
    ];

    assert_eq!(did_load.category(), Some("page_did"));
    assert_eq!(Action::Quit.category(), None);
    for intent in &intents {
        assert_eq!(intent.category(), Some("list"), "{intent:?}");
        assert!(intent.is_list());
    }
    assert!(did_load.is_page_did());
    assert!(!did_load.is_list());
}

#[test]
fn test_intents_are_distinguished_from_results() {
    let actions = vec![
        Action::ListLoadInitial,
        Action::ListLoadMore,
        Action::ListRefresh,
        Action::ListRetry,
        Action::ListRetryPage,
    ];
    assert!(actions.iter().all(Action::is_intent));

    assert_emitted!(actions, Action::ListRefresh);
    assert_not_emitted!(actions, Action::Quit);
    assert!(!Action::DetailsDidLoad {
        generation: 0,
        details: Vec::new()
    }
    .is_intent());
}
