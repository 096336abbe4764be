use thiserror::Error;
use tracing::{debug, error, info, warn};

use q2d_core::domain::state::WorkflowState;
use q2d_core::flows::{Clock, SystemClock, TransitionOutcome, WorkflowAction, WorkflowEngine};

use crate::repositories::{RepositoryError, StateStore};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("workflow state could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Owner of the live workflow state.
///
/// Restores the saved snapshot on open, then runs every action through the
/// reducer and writes the whole new state back under the same key. Storage
/// failures are logged and never surface to the caller: the in-memory state
/// stays authoritative for the rest of the session.
pub struct WorkflowStore<S, C = SystemClock> {
    store: S,
    key: String,
    engine: WorkflowEngine<C>,
    state: WorkflowState,
}

impl<S> WorkflowStore<S, SystemClock>
where
    S: StateStore,
{
    pub async fn open(store: S, key: impl Into<String>) -> Self {
        Self::open_with_clock(store, key, SystemClock).await
    }
}

impl<S, C> WorkflowStore<S, C>
where
    S: StateStore,
    C: Clock,
{
    pub async fn open_with_clock(store: S, key: impl Into<String>, clock: C) -> Self {
        let key = key.into();
        let engine = WorkflowEngine::new(clock);
        let mut state = WorkflowState::default();

        match store.load(&key).await {
            Ok(Some(blob)) => match serde_json::from_str::<WorkflowState>(&blob) {
                Ok(saved) => {
                    let transition = engine.apply(&state, WorkflowAction::LoadState(saved));
                    info!(
                        event_name = "workflow.state.restored",
                        state_key = %key,
                        outcome = ?transition.outcome,
                        "restored saved workflow state"
                    );
                    state = transition.state;
                }
                Err(parse_error) => {
                    warn!(
                        event_name = "workflow.state.unreadable",
                        state_key = %key,
                        error = %parse_error,
                        "saved workflow state could not be parsed; starting empty"
                    );
                }
            },
            Ok(None) => {
                debug!(
                    event_name = "workflow.state.absent",
                    state_key = %key,
                    "no saved workflow state"
                );
            }
            Err(load_error) => {
                warn!(
                    event_name = "workflow.state.load_failed",
                    state_key = %key,
                    error = %load_error,
                    "saved workflow state could not be loaded; starting empty"
                );
            }
        }

        Self { store, key, engine, state }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Applies one action and persists the resulting state.
    pub async fn dispatch(&mut self, action: WorkflowAction) -> TransitionOutcome {
        let action_name = action.name();
        let item_id = action.item_id().map(|id| id.to_string()).unwrap_or_default();

        let transition = self.engine.apply(&self.state, action);
        if transition.outcome.is_applied() {
            info!(
                event_name = "workflow.dispatch.applied",
                action = action_name,
                item_id = %item_id,
                outcome = ?transition.outcome,
                "workflow action applied"
            );
        } else {
            warn!(
                event_name = "workflow.dispatch.unchanged",
                action = action_name,
                item_id = %item_id,
                outcome = ?transition.outcome,
                "workflow action left state unchanged"
            );
        }
        self.state = transition.state;

        if let Err(save_error) = self.persist().await {
            error!(
                event_name = "workflow.state.save_failed",
                state_key = %self.key,
                action = action_name,
                error = %save_error,
                "workflow state could not be saved"
            );
        }

        transition.outcome
    }

    /// Dispatches `actions` in order, one full dispatch at a time.
    pub async fn dispatch_all<I>(&mut self, actions: I) -> Vec<TransitionOutcome>
    where
        I: IntoIterator<Item = WorkflowAction>,
    {
        let mut outcomes = Vec::new();
        for action in actions {
            outcomes.push(self.dispatch(action).await);
        }
        outcomes
    }

    /// Writes the current state now, reporting failures to the caller.
    pub async fn persist(&self) -> Result<(), PersistenceError> {
        let blob = serde_json::to_string(&self.state)?;
        self.store.save(&self.key, &blob).await?;
        Ok(())
    }

    pub fn into_inner(self) -> (S, WorkflowState) {
        (self.store, self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use q2d_core::domain::attributes::{FollowupStatus, ItemAttributes};
    use q2d_core::domain::item::{Item, ItemId};
    use q2d_core::domain::state::WorkflowState;
    use q2d_core::flows::{
        AdvancePayload, FixedClock, TransitionOutcome, UnchangedReason, WorkflowAction,
    };
    use q2d_core::pipeline::Stage;

    use super::WorkflowStore;
    use crate::repositories::{InMemoryStateStore, RepositoryError, StateStore};

    const KEY: &str = "q2d.workflow_state.v1";

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).single().expect("valid timestamp"))
    }

    fn item(id: &str) -> Item {
        Item::new(ItemId::from(id), "Priya Patel", "9876500000", "Hyderabad")
    }

    struct FailingStore {
        attempts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StateStore for FailingStore {
        async fn load(&self, _key: &str) -> Result<Option<String>, RepositoryError> {
            Err(RepositoryError::Decode("disk unavailable".to_string()))
        }

        async fn save(&self, _key: &str, _blob: &str) -> Result<(), RepositoryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Decode("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn every_dispatch_writes_the_full_state() {
        let mut store =
            WorkflowStore::open_with_clock(InMemoryStateStore::default(), KEY, clock()).await;

        store.dispatch(WorkflowAction::AddItem(item("A1"))).await;
        let outcome = store
            .dispatch(WorkflowAction::Advance(AdvancePayload {
                id: ItemId::from("A1"),
                current_stage: Stage::Followup,
                data: ItemAttributes {
                    status: Some(FollowupStatus::OrderReceived),
                    ..ItemAttributes::default()
                },
            }))
            .await;
        assert!(matches!(outcome, TransitionOutcome::Advanced { to: Stage::Stock, .. }));

        let (backing, state) = store.into_inner();
        let blob = backing.load(KEY).await.expect("load").expect("blob saved");
        let saved: WorkflowState = serde_json::from_str(&blob).expect("parse blob");
        assert_eq!(saved, state);
        assert_eq!(saved.items[0].current_stage, Stage::Stock);
    }

    #[tokio::test]
    async fn reopening_restores_the_saved_state() {
        let mut first =
            WorkflowStore::open_with_clock(InMemoryStateStore::default(), KEY, clock()).await;
        first.dispatch(WorkflowAction::AddItem(item("A1"))).await;
        let (backing, state) = first.into_inner();

        let second = WorkflowStore::open_with_clock(backing, KEY, clock()).await;
        assert_eq!(second.state(), &state);
    }

    #[tokio::test]
    async fn unparseable_blob_starts_empty() {
        let backing = InMemoryStateStore::with_blob(KEY, "{\"items\": \"not a list\"}");
        let store = WorkflowStore::open_with_clock(backing, KEY, clock()).await;

        assert_eq!(store.state(), &WorkflowState::default());
    }

    #[tokio::test]
    async fn other_keys_are_ignored() {
        let backing = InMemoryStateStore::with_blob("q2d.workflow_state.v0", "{\"items\":[]}");
        let store = WorkflowStore::open_with_clock(backing, KEY, clock()).await;

        assert!(store.state().items.is_empty());
        assert_eq!(store.key(), KEY);
    }

    #[tokio::test]
    async fn storage_failures_do_not_interrupt_dispatch() {
        let failing = FailingStore { attempts: AtomicUsize::new(0) };
        let mut store = WorkflowStore::open_with_clock(failing, KEY, clock()).await;

        let added = store.dispatch(WorkflowAction::AddItem(item("A1"))).await;
        let missing = store
            .dispatch(WorkflowAction::Advance(AdvancePayload {
                id: ItemId::from("ZZ"),
                current_stage: Stage::Followup,
                data: ItemAttributes::default(),
            }))
            .await;

        assert!(matches!(added, TransitionOutcome::ItemAdded { .. }));
        assert_eq!(
            missing,
            TransitionOutcome::Unchanged(UnchangedReason::ItemNotFound {
                item_id: ItemId::from("ZZ")
            })
        );
        assert_eq!(store.state().items.len(), 1);
        assert!(store.persist().await.is_err());

        let (failing, _) = store.into_inner();
        assert_eq!(failing.attempts.load(Ordering::SeqCst), 3);
    }
}
