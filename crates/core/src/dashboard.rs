use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::activity::ActivityEntry;
use crate::domain::attributes::FollowupStatus;
use crate::domain::item::Item;
use crate::domain::state::WorkflowState;
use crate::pipeline::{Stage, PIPELINE};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FollowupBreakdown {
    /// Items that are or have been at the followup stage.
    pub tracked: usize,
    pub follow_up: usize,
    pub order_received: usize,
    pub not_received: usize,
    pub need_time: usize,
}

impl FollowupBreakdown {
    /// Share of tracked followups with `count`, as a whole percentage.
    pub fn percent(&self, count: usize) -> usize {
        count * 100 / self.tracked.max(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: Stage,
    pub label: &'static str,
    pub pending: usize,
    pub history: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_items: usize,
    pub pending: usize,
    pub completed: usize,
    pub total_revenue: Decimal,
    pub todays_followups: usize,
    pub followup: FollowupBreakdown,
    pub stages: Vec<StageCount>,
    pub recent_activity: Vec<ActivityEntry>,
}

impl DashboardSummary {
    pub fn from_state(state: &WorkflowState, today: NaiveDate) -> Self {
        let items = &state.items;
        let completed = items.iter().filter(|item| item.is_completed()).count();

        let total_revenue = items
            .iter()
            .filter_map(|item| item.quotation_amount)
            .fold(Decimal::ZERO, Decimal::saturating_add);

        let todays_followups = items
            .iter()
            .filter(|item| {
                item.current_stage == Stage::Followup && item.expected_delivery_date == Some(today)
            })
            .count();

        let stages = PIPELINE
            .iter()
            .map(|&stage| StageCount {
                stage,
                label: stage.label(),
                pending: state.pending_items(stage, "").len(),
                history: state.history_items(stage, "").len(),
            })
            .collect();

        Self {
            total_items: items.len(),
            pending: items.len() - completed,
            completed,
            total_revenue,
            todays_followups,
            followup: followup_breakdown(items),
            stages,
            recent_activity: state.activity_log.entries().to_vec(),
        }
    }
}

fn followup_breakdown(items: &[Item]) -> FollowupBreakdown {
    let tracked: Vec<&Item> = items
        .iter()
        .filter(|item| item.current_stage == Stage::Followup || item.has_log_for(Stage::Followup))
        .collect();
    let count =
        |status| tracked.iter().filter(|item| item.attributes.status == Some(status)).count();

    FollowupBreakdown {
        tracked: tracked.len(),
        follow_up: count(FollowupStatus::FollowUp),
        order_received: count(FollowupStatus::OrderReceived),
        not_received: count(FollowupStatus::NotReceived),
        need_time: count(FollowupStatus::NeedTime),
    }
}
