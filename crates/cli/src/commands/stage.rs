use q2d_core::auth::Role;
use q2d_core::domain::item::Item;
use q2d_core::domain::state::WorkflowState;
use q2d_core::errors::{ApplicationError, DomainError};
use q2d_core::flows::FormError;
use q2d_core::pipeline::Stage;
use q2d_core::stages::{stage_config, StageConfig};

use crate::commands::{load_state, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageView {
    Pending,
    History,
}

pub fn run(stage_id: &str, search: &str, view: StageView, role: Role) -> CommandResult {
    let config = match resolve_stage(stage_id) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_application_error("stage", error),
    };

    if !role.can_view(config.stage) {
        return CommandResult::failure(
            "stage",
            "stage_not_visible",
            format!("stage `{}` is not available to the {} role", config.stage, role.as_str()),
            7,
        );
    }

    let state = match load_state("stage") {
        Ok(state) => state,
        Err(failure) => return failure,
    };

    CommandResult::rendered(render_stage(&state, config, search, view))
}

pub(crate) fn resolve_stage(stage_id: &str) -> Result<&'static StageConfig, ApplicationError> {
    let stage = stage_id.parse::<Stage>().map_err(ApplicationError::from)?;
    stage_config(stage).ok_or_else(|| DomainError::from(FormError::NoForm(stage)).into())
}

fn render_stage(
    state: &WorkflowState,
    config: &StageConfig,
    search: &str,
    view: StageView,
) -> String {
    let (items, columns, heading) = match view {
        StageView::Pending => {
            (state.pending_items(config.stage, search), config.pending_columns, "pending")
        }
        StageView::History => {
            (state.history_items(config.stage, search), config.history_columns, "history")
        }
    };

    let mut lines = vec![
        format!("{} ({})", config.title, config.subtitle),
        format!("{} {heading} records", items.len()),
    ];
    if items.is_empty() {
        lines.push("no records".to_string());
        return lines.join("\n");
    }

    lines.extend(render_table(columns, &items));
    lines.join("\n")
}

fn render_table(columns: &[&str], items: &[&Item]) -> Vec<String> {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| columns.iter().map(|label| item.column_value(label)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, label)| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(label.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut lines = vec![format_row(columns, &widths)];
    lines.push(widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("-+-"));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(format_row(&cells, &widths));
    }
    lines
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
