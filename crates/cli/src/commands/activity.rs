use q2d_core::domain::activity::ActivityEntry;

use crate::commands::{load_state, CommandResult};

pub fn run() -> CommandResult {
    match load_state("activity") {
        Ok(state) => CommandResult::rendered(render(state.activity_log.entries())),
        Err(failure) => failure,
    }
}

fn render(entries: &[ActivityEntry]) -> String {
    if entries.is_empty() {
        return "no recent activity".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {} ({})",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.customer_name,
                entry.action,
                entry.stage
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
