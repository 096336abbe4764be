use q2d_core::domain::item::ItemId;
use q2d_core::errors::{ApplicationError, DomainError};
use q2d_core::flows::{FormValues, StageSubmission, TransitionOutcome};
use tracing::info;

use crate::commands::stage::resolve_stage;
use crate::commands::{build_runtime, load_config, open_store, CommandResult};

/// Submits a stage form for one item: `fields` are `name=value` pairs.
pub fn run(item_id: &str, stage_id: &str, fields: &[String]) -> CommandResult {
    let stage_config = match resolve_stage(stage_id) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_application_error("update", error),
    };

    let data = match FormValues::from_pairs(fields)
        .and_then(|values| values.into_attributes(stage_config))
    {
        Ok(data) => data,
        Err(error) => {
            return CommandResult::from_application_error(
                "update",
                DomainError::from(error).into(),
            );
        }
    };

    let config = match load_config("update") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("update") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let mut store = open_store("update", &config.storage).await?;
        let id = ItemId::from(item_id);
        let item = store.state().find_item(&id).cloned().ok_or_else(|| {
            CommandResult::from_application_error(
                "update",
                ApplicationError::ItemNotFound(item_id.to_string()),
            )
        })?;

        let actions = StageSubmission::plan(&item, stage_config.stage, data).map_err(|error| {
            CommandResult::from_application_error("update", DomainError::from(error).into())
        })?;
        let outcomes = store.dispatch_all(actions).await;

        store.persist().await.map_err(|error| {
            CommandResult::from_application_error(
                "update",
                ApplicationError::Persistence(error.to_string()),
            )
        })?;

        info!(
            event_name = "cli.update.submitted",
            item_id = %id,
            stage = %stage_config.stage,
            "stage form submitted"
        );
        Ok::<_, CommandResult>(outcomes)
    });

    match result {
        Ok(outcomes) => {
            let message = outcomes.first().map(describe_outcome).unwrap_or_default();
            CommandResult::success("update", message)
        }
        Err(failure) => failure,
    }
}

fn describe_outcome(outcome: &TransitionOutcome) -> String {
    match outcome {
        TransitionOutcome::Advanced { item_id, from, to } => {
            format!("{item_id} moved from {} to {}", from.label(), to.label())
        }
        TransitionOutcome::Annotated { item_id, stage } => {
            format!("{item_id} stays at {}; details recorded", stage.label())
        }
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use q2d_core::domain::item::ItemId;
    use q2d_core::flows::TransitionOutcome;
    use q2d_core::pipeline::Stage;

    use super::describe_outcome;

    #[test]
    fn advance_names_both_stages() {
        let outcome = TransitionOutcome::Advanced {
            item_id: ItemId::from("A1"),
            from: Stage::Payment,
            to: Stage::Completed,
        };
        assert_eq!(describe_outcome(&outcome), "A1 moved from Payment Collection to Completed");
    }

    #[test]
    fn annotation_keeps_the_stage() {
        let outcome =
            TransitionOutcome::Annotated { item_id: ItemId::from("A1"), stage: Stage::Followup };
        assert_eq!(describe_outcome(&outcome), "A1 stays at Quotation Followup; details recorded");
    }
}
