use serde::{Deserialize, Serialize};

use crate::domain::activity::ActivityLog;
use crate::domain::item::{Item, ItemId};
use crate::pipeline::Stage;

/// Full snapshot of the tracker; the unit that is persisted and restored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub items: Vec<Item>,
    pub activity_log: ActivityLog,
}

impl WorkflowState {
    pub fn find_item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub(crate) fn item_index(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Items currently queued at `stage`.
    pub fn pending_items<'a>(&'a self, stage: Stage, search: &'a str) -> Vec<&'a Item> {
        self.items
            .iter()
            .filter(|item| item.current_stage == stage && item.matches_search(search))
            .collect()
    }

    /// Items that were handled at `stage` and have since moved on.
    pub fn history_items<'a>(&'a self, stage: Stage, search: &'a str) -> Vec<&'a Item> {
        self.items
            .iter()
            .filter(|item| {
                item.current_stage != stage
                    && item.has_log_for(stage)
                    && item.matches_search(search)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::WorkflowState;
    use crate::domain::attributes::ItemAttributes;
    use crate::domain::item::{Item, ItemId};
    use crate::pipeline::Stage;

    fn state() -> WorkflowState {
        let queued = Item::new(ItemId::from("LEAD-1"), "Amit Sharma", "9000000001", "Mumbai");

        let mut moved = Item::new(ItemId::from("LEAD-2"), "Priya Patel", "9000000002", "Delhi");
        moved.record_stage_data(Stage::Followup, ItemAttributes::default(), Utc::now());
        moved.current_stage = Stage::Stock;

        let mut annotated =
            Item::new(ItemId::from("LEAD-3"), "Amit Jain", "9000000003", "Chennai");
        annotated.record_stage_data(Stage::Followup, ItemAttributes::default(), Utc::now());

        WorkflowState { items: vec![queued, moved, annotated], ..WorkflowState::default() }
    }

    #[test]
    fn pending_items_filter_by_stage_and_name() {
        let state = state();
        let ids: Vec<&str> =
            state.pending_items(Stage::Followup, "amit").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["LEAD-1", "LEAD-3"]);
        assert_eq!(state.pending_items(Stage::Stock, "").len(), 1);
    }

    #[test]
    fn history_excludes_items_still_at_the_stage() {
        let state = state();
        let ids: Vec<&str> =
            state.history_items(Stage::Followup, "").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["LEAD-2"]);
    }

    #[test]
    fn find_item_matches_exact_id() {
        let state = state();
        assert!(state.find_item(&ItemId::from("LEAD-2")).is_some());
        assert!(state.find_item(&ItemId::from("lead-2")).is_none());
    }
}
