pub mod engine;
pub mod states;
pub mod submission;

pub use engine::{reduce, Clock, FixedClock, SystemClock, WorkflowEngine};
pub use states::{
    ActivityPayload, AdvancePayload, StageActionPayload, Transition, TransitionOutcome,
    UnchangedReason, WorkflowAction,
};
pub use submission::{keeps_item_at_stage, FormError, FormValues, StageSubmission};
