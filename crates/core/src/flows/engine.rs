use chrono::{DateTime, Utc};

use crate::domain::activity::ActivityEntry;
use crate::domain::item::ItemId;
use crate::domain::state::WorkflowState;
use crate::flows::states::{Transition, TransitionOutcome, UnchangedReason, WorkflowAction};
use crate::pipeline::next_stage;

/// Source of the timestamps stamped onto stage logs and activity entries.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct WorkflowEngine<C = SystemClock> {
    clock: C,
}

impl<C> WorkflowEngine<C>
where
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn apply(&self, state: &WorkflowState, action: WorkflowAction) -> Transition {
        reduce(state, action, self.clock.now())
    }

    /// Folds `actions` over `initial`, returning the final state and every outcome.
    pub fn replay<I>(
        &self,
        initial: &WorkflowState,
        actions: I,
    ) -> (WorkflowState, Vec<TransitionOutcome>)
    where
        I: IntoIterator<Item = WorkflowAction>,
    {
        let mut state = initial.clone();
        let mut outcomes = Vec::new();
        for action in actions {
            let transition = self.apply(&state, action);
            state = transition.state;
            outcomes.push(transition.outcome);
        }
        (state, outcomes)
    }
}

impl Default for WorkflowEngine<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

/// The workflow state machine.
///
/// Pure: the input state is never touched and `now` is the only source of
/// time. Actions aimed at a missing item or at a completed item leave the
/// state as it was and say so through [`TransitionOutcome::Unchanged`]. The
/// state is cloned once, after the target has been checked.
pub fn reduce(state: &WorkflowState, action: WorkflowAction, now: DateTime<Utc>) -> Transition {
    match action {
        WorkflowAction::AddItem(item) => {
            let item_id = item.id.clone();
            let mut next = state.clone();
            next.items.push(item);
            applied(next, TransitionOutcome::ItemAdded { item_id })
        }
        WorkflowAction::UpdateItem(item) => {
            let Some(index) = state.item_index(&item.id) else {
                return unchanged(state, UnchangedReason::ItemNotFound { item_id: item.id });
            };
            let item_id = item.id.clone();
            let mut next = state.clone();
            next.items[index] = item;
            applied(next, TransitionOutcome::ItemReplaced { item_id })
        }
        WorkflowAction::Advance(payload) => {
            let from = payload.current_stage;
            let index = match open_item(state, &payload.id) {
                Ok(_) if from.is_terminal() => {
                    let reason = UnchangedReason::TerminalStage { item_id: payload.id };
                    return unchanged(state, reason);
                }
                Ok(index) => index,
                Err(reason) => return unchanged(state, reason),
            };

            let to = next_stage(from);
            let mut next = state.clone();
            let item = &mut next.items[index];
            item.record_stage_data(from, payload.data, now);
            // A stale caller stage must not drag the item backwards.
            let outcome = if to > item.current_stage {
                item.current_stage = to;
                TransitionOutcome::Advanced { item_id: payload.id, from, to }
            } else {
                TransitionOutcome::Annotated { item_id: payload.id, stage: from }
            };
            applied(next, outcome)
        }
        WorkflowAction::LogStageAction(payload) => {
            let index = match open_item(state, &payload.id) {
                Ok(index) => index,
                Err(reason) => return unchanged(state, reason),
            };
            let mut next = state.clone();
            next.items[index].record_stage_data(payload.stage, payload.data, now);
            let outcome =
                TransitionOutcome::Annotated { item_id: payload.id, stage: payload.stage };
            applied(next, outcome)
        }
        WorkflowAction::AddActivity(payload) => {
            let mut next = state.clone();
            let evicted = next.activity_log.record(ActivityEntry {
                customer_name: payload.customer_name,
                action: payload.action,
                stage: payload.stage,
                timestamp: now,
            });
            applied(next, TransitionOutcome::ActivityRecorded { evicted })
        }
        WorkflowAction::LoadState(snapshot) => {
            let items = snapshot.items.len();
            applied(snapshot, TransitionOutcome::Hydrated { items })
        }
    }
}

/// Index of an item that can still take stage data.
fn open_item(state: &WorkflowState, id: &ItemId) -> Result<usize, UnchangedReason> {
    match state.item_index(id) {
        None => Err(UnchangedReason::ItemNotFound { item_id: id.clone() }),
        Some(index) if state.items[index].is_completed() => {
            Err(UnchangedReason::TerminalStage { item_id: id.clone() })
        }
        Some(index) => Ok(index),
    }
}

fn applied(state: WorkflowState, outcome: TransitionOutcome) -> Transition {
    Transition { state, outcome }
}

fn unchanged(state: &WorkflowState, reason: UnchangedReason) -> Transition {
    Transition { state: state.clone(), outcome: TransitionOutcome::Unchanged(reason) }
}
