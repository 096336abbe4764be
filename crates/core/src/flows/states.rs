use serde::{Deserialize, Serialize};

use crate::domain::attributes::ItemAttributes;
use crate::domain::item::{Item, ItemId};
use crate::domain::state::WorkflowState;
use crate::pipeline::Stage;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancePayload {
    pub id: ItemId,
    pub current_stage: Stage,
    pub data: ItemAttributes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageActionPayload {
    pub id: ItemId,
    pub stage: Stage,
    pub data: ItemAttributes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub customer_name: String,
    pub action: String,
    pub stage: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowAction {
    AddItem(Item),
    UpdateItem(Item),
    #[serde(rename = "MOVE_TO_NEXT_STAGE")]
    Advance(AdvancePayload),
    LogStageAction(StageActionPayload),
    AddActivity(ActivityPayload),
    LoadState(WorkflowState),
}

impl WorkflowAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddItem(_) => "add_item",
            Self::UpdateItem(_) => "update_item",
            Self::Advance(_) => "advance",
            Self::LogStageAction(_) => "log_stage_action",
            Self::AddActivity(_) => "add_activity",
            Self::LoadState(_) => "load_state",
        }
    }

    /// Item targeted by the action, when there is one.
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            Self::AddItem(item) | Self::UpdateItem(item) => Some(&item.id),
            Self::Advance(payload) => Some(&payload.id),
            Self::LogStageAction(payload) => Some(&payload.id),
            Self::AddActivity(_) | Self::LoadState(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    ItemNotFound { item_id: ItemId },
    TerminalStage { item_id: ItemId },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    ItemAdded { item_id: ItemId },
    ItemReplaced { item_id: ItemId },
    Advanced { item_id: ItemId, from: Stage, to: Stage },
    Annotated { item_id: ItemId, stage: Stage },
    ActivityRecorded { evicted: usize },
    Hydrated { items: usize },
    Unchanged(UnchangedReason),
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

/// New state produced by one dispatch, plus what happened.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: WorkflowState,
    pub outcome: TransitionOutcome,
}
