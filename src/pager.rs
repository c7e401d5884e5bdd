//! Pagination coordinator runtime
//!
//! A single actor task owns the store and is the only writer of
//! [`ViewState`]. Callers send intents over a channel; effect tasks report
//! back over the same channel. Every state change is published as an
//! immutable `Arc<ViewState>` snapshot on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use tui_dispatch::{EffectStore, TaskKey, TaskManager};

use crate::action::Action;
use crate::effect::Effect;
use crate::provider::PokemonProvider;
use crate::reducer::reducer;
use crate::state::{DetailOutcome, PokemonDetail, PokemonSummary, ViewState};

#[derive(Clone, Debug, Default)]
pub struct PagerOptions {
    /// Dispatch `ListLoadInitial` as soon as the actor starts
    pub autoload: bool,
}

/// Handle to a running coordinator. Intents are fire-and-forget; their
/// effects are only observable through [`Pager::subscribe`].
pub struct Pager {
    intents: mpsc::UnboundedSender<Action>,
    snapshots: watch::Receiver<Arc<ViewState>>,
    actor: Option<JoinHandle<()>>,
}

impl Pager {
    pub fn spawn(provider: Arc<dyn PokemonProvider>) -> Self {
        Self::spawn_with(provider, PagerOptions::default())
    }

    pub fn spawn_with(provider: Arc<dyn PokemonProvider>, options: PagerOptions) -> Self {
        let (intents, inbox) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(Arc::new(ViewState::default()));
        if options.autoload {
            let _ = intents.send(Action::ListLoadInitial);
        }
        let actor = tokio::spawn(run(provider, inbox, intents.clone(), publisher));
        Self {
            intents,
            snapshots,
            actor: Some(actor),
        }
    }

    pub fn load_initial(&self) {
        self.send(Action::ListLoadInitial);
    }

    pub fn load_more(&self) {
        self.send(Action::ListLoadMore);
    }

    pub fn refresh(&self) {
        self.send(Action::ListRefresh);
    }

    pub fn retry(&self) {
        self.send(Action::ListRetry);
    }

    pub fn retry_page(&self) {
        self.send(Action::ListRetryPage);
    }

    /// Receiver yielding the current snapshot and every later one
    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Issue one intent and wait until the coordinator has settled after it.
    /// `None` if nothing settled within `limit`, which is also what an
    /// ignored intent looks like.
    pub async fn settle_after(
        &self,
        intent: fn(&Pager),
        limit: Duration,
    ) -> Option<Arc<ViewState>> {
        let mut snapshots = self.subscribe();
        snapshots.borrow_and_update();
        intent(self);
        let settled = async move {
            snapshots.changed().await.ok()?;
            let ready = snapshots.wait_for(|state| state.is_settled()).await.ok()?;
            Some(Arc::clone(&ready))
        };
        match tokio::time::timeout(limit, settled).await {
            Ok(state) => state,
            Err(_) => {
                warn!(?limit, "pager did not settle");
                None
            }
        }
    }

    /// Stop the actor and abort any fetches still in flight
    pub async fn shutdown(mut self) {
        let _ = self.intents.send(Action::Quit);
        if let Some(actor) = self.actor.take() {
            if let Err(err) = actor.await {
                warn!(error = %err, "pager actor ended abnormally");
            }
        }
    }

    fn send(&self, action: Action) {
        debug!(?action, "intent");
        if self.intents.send(action).is_err() {
            warn!("pager is not running, intent dropped");
        }
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if self.actor.is_some() {
            let _ = self.intents.send(Action::Quit);
        }
    }
}

async fn run(
    provider: Arc<dyn PokemonProvider>,
    mut inbox: mpsc::UnboundedReceiver<Action>,
    feedback: mpsc::UnboundedSender<Action>,
    publisher: watch::Sender<Arc<ViewState>>,
) {
    let mut store = EffectStore::new(ViewState::default(), reducer);
    let mut tasks = TaskManager::new(feedback);
    let mut batches: u64 = 0;
    info!("pager started");

    while let Some(action) = inbox.recv().await {
        if matches!(action, Action::Quit) {
            break;
        }
        let is_intent = action.is_intent();
        let result = store.dispatch(action);
        if result.changed {
            publisher.send_replace(Arc::new(store.state().clone()));
        } else if is_intent {
            debug!("intent ignored");
        } else {
            debug!("stale result dropped");
        }
        for effect in result.effects {
            handle_effect(&mut tasks, &mut batches, effect, Arc::clone(&provider));
        }
    }

    tasks.cancel_all();
    debug!("pager stopped");
}

/// Only one page request is ever current, so a new one replaces the task of
/// the one it supersedes. Detail batches each get their own key.
fn handle_effect(
    tasks: &mut TaskManager<Action>,
    batches: &mut u64,
    effect: Effect,
    provider: Arc<dyn PokemonProvider>,
) {
    match effect {
        Effect::FetchPage { request } => {
            tasks.spawn(TaskKey::new("page"), async move {
                match provider.fetch_page(request.page).await {
                    Ok(summaries) => {
                        debug!(page = request.page, count = summaries.len(), "page loaded");
                        Action::PageDidLoad { request, summaries }
                    }
                    Err(err) => {
                        warn!(page = request.page, error = %err, "page fetch failed");
                        Action::PageDidError {
                            request,
                            error: err.to_string(),
                        }
                    }
                }
            });
        }
        Effect::FetchDetails {
            generation,
            summaries,
        } => {
            *batches += 1;
            let key = format!("details_{generation}_{batches}");
            tasks.spawn(TaskKey::new(key), async move {
                let details = fetch_details(provider, summaries).await;
                Action::DetailsDidLoad {
                    generation,
                    details,
                }
            });
        }
    }
}

/// Fetch every detail concurrently and wait for all of them. Failures are
/// reported as `None`; the result keeps the order of `summaries`.
pub async fn fetch_details(
    provider: Arc<dyn PokemonProvider>,
    summaries: Vec<PokemonSummary>,
) -> Vec<DetailOutcome> {
    let mut join_set = JoinSet::new();
    for (index, summary) in summaries.iter().cloned().enumerate() {
        let provider = Arc::clone(&provider);
        join_set.spawn(async move {
            match provider.fetch_detail(&summary).await {
                Ok(detail) => (index, Some(detail)),
                Err(err) => {
                    debug!(id = summary.id, error = %err, "detail fetch failed");
                    (index, None)
                }
            }
        });
    }

    let mut details: Vec<Option<PokemonDetail>> = vec![None; summaries.len()];
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok((index, detail)) => details[index] = detail,
            Err(err) => warn!(error = %err, "detail task failed"),
        }
    }

    let failed = details.iter().filter(|detail| detail.is_none()).count();
    debug!(total = summaries.len(), failed, "detail batch finished");

    summaries
        .into_iter()
        .zip(details)
        .map(|(summary, detail)| DetailOutcome {
            id: summary.id,
            detail,
        })
        .collect()
}
