pub mod auth;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod pipeline;
pub mod stages;

pub use auth::{authenticate, AuthError, Role, Session};
pub use dashboard::{DashboardSummary, FollowupBreakdown, StageCount};
pub use domain::activity::{ActivityEntry, ActivityLog, ACTIVITY_LOG_CAPACITY};
pub use domain::attributes::ItemAttributes;
pub use domain::item::{Item, ItemId, StageLog};
pub use domain::state::WorkflowState;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{
    FormError, FormValues, StageSubmission, Transition, TransitionOutcome, UnchangedReason,
    WorkflowAction, WorkflowEngine,
};
pub use pipeline::{next_stage, Stage, PIPELINE, TERMINAL_STAGE};
pub use stages::{stage_config, StageConfig};
