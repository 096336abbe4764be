use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Working stages of an order plus the terminal `Completed` marker.
///
/// Declaration order is pipeline order, so the derived `Ord` can be used to
/// check that an item never moves backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Followup,
    Stock,
    Po,
    Delivery,
    Receiving,
    DispatchPlan,
    Dispatch,
    Confirmation,
    Installation,
    InstallMaterial,
    CustomerReview,
    Payment,
    Completed,
}

pub const PIPELINE: [Stage; 12] = [
    Stage::Followup,
    Stage::Stock,
    Stage::Po,
    Stage::Delivery,
    Stage::Receiving,
    Stage::DispatchPlan,
    Stage::Dispatch,
    Stage::Confirmation,
    Stage::Installation,
    Stage::InstallMaterial,
    Stage::CustomerReview,
    Stage::Payment,
];

pub const TERMINAL_STAGE: Stage = Stage::Completed;

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Followup => "followup",
            Self::Stock => "stock",
            Self::Po => "po",
            Self::Delivery => "delivery",
            Self::Receiving => "receiving",
            Self::DispatchPlan => "dispatch-plan",
            Self::Dispatch => "dispatch",
            Self::Confirmation => "confirmation",
            Self::Installation => "installation",
            Self::InstallMaterial => "install-material",
            Self::CustomerReview => "customer-review",
            Self::Payment => "payment",
            Self::Completed => "completed",
        }
    }

    /// Human label used by the dashboard and navigation.
    pub fn label(self) -> &'static str {
        match self {
            Self::Followup => "Quotation Followup",
            Self::Stock => "Check Delivery For Stock",
            Self::Po => "Make PO",
            Self::Delivery => "Track Delivery",
            Self::Receiving => "Receiving Stock",
            Self::DispatchPlan => "Dispatch Planning",
            Self::Dispatch => "Dispatch",
            Self::Confirmation => "Receiving Confirmation",
            Self::Installation => "Send to Installation",
            Self::InstallMaterial => "Install to Material",
            Self::CustomerReview => "Customer Review",
            Self::Payment => "Payment Collection",
            Self::Completed => "Completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TERMINAL_STAGE
    }

    /// Index in [`PIPELINE`]; `None` for the terminal marker.
    pub fn position(self) -> Option<usize> {
        PIPELINE.iter().position(|stage| *stage == self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        PIPELINE
            .iter()
            .copied()
            .chain(std::iter::once(TERMINAL_STAGE))
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownStage(value.to_string()))
    }
}

/// Stage an item moves to after `current` is done.
///
/// The last working stage graduates to [`TERMINAL_STAGE`]. Anything outside
/// the working sequence is returned unchanged, so advancing a completed item
/// is a no-op rather than a wrap-around.
pub fn next_stage(current: Stage) -> Stage {
    match current.position() {
        Some(index) if index + 1 < PIPELINE.len() => PIPELINE[index + 1],
        Some(_) => TERMINAL_STAGE,
        None => current,
    }
}

/// String form of [`next_stage`] for identifiers that arrive unparsed.
/// Unknown identifiers come back as given.
pub fn next_stage_id(current: &str) -> &str {
    match current.parse::<Stage>() {
        Ok(stage) => next_stage(stage).as_str(),
        Err(_) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::{next_stage, next_stage_id, Stage, PIPELINE, TERMINAL_STAGE};
    use crate::errors::DomainError;

    #[test]
    fn walks_every_stage_in_declared_order() {
        let mut visited = vec![Stage::Followup];
        let mut current = Stage::Followup;
        while !current.is_terminal() {
            current = next_stage(current);
            visited.push(current);
        }

        let mut expected = PIPELINE.to_vec();
        expected.push(TERMINAL_STAGE);
        assert_eq!(visited, expected);
    }

    #[test]
    fn last_stage_graduates_to_terminal() {
        assert_eq!(next_stage(Stage::CustomerReview), Stage::Payment);
        assert_eq!(next_stage(Stage::Payment), Stage::Completed);
    }

    #[test]
    fn terminal_stage_does_not_loop_back() {
        assert_eq!(next_stage(Stage::Completed), Stage::Completed);
        assert_eq!(Stage::Completed.position(), None);
    }

    #[test]
    fn string_lookup_passes_unknown_ids_through() {
        assert_eq!(next_stage_id("dispatch-plan"), "dispatch");
        assert_eq!(next_stage_id("payment"), "completed");
        assert_eq!(next_stage_id("warehouse-audit"), "warehouse-audit");
    }

    #[test]
    fn parses_kebab_case_identifiers() {
        assert_eq!("install-material".parse::<Stage>(), Ok(Stage::InstallMaterial));
        assert_eq!(" Customer-Review ".parse::<Stage>(), Ok(Stage::CustomerReview));
        assert_eq!(
            "shipping".parse::<Stage>(),
            Err(DomainError::UnknownStage("shipping".to_string()))
        );
    }

    #[test]
    fn serde_uses_the_same_identifiers_as_display() {
        for stage in PIPELINE.iter().copied().chain(std::iter::once(TERMINAL_STAGE)) {
            let encoded = serde_json::to_string(&stage).expect("serialize stage");
            assert_eq!(encoded, format!("\"{stage}\""));
        }
    }

    #[test]
    fn ordering_matches_pipeline_positions() {
        assert!(Stage::Followup < Stage::Stock);
        assert!(Stage::Payment < Stage::Completed);
        assert!(PIPELINE.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
