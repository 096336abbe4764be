use chrono::{Local, NaiveDate};
use q2d_core::dashboard::DashboardSummary;
use q2d_core::domain::state::WorkflowState;

use crate::commands::{load_state, CommandResult};

pub fn run(json_output: bool) -> CommandResult {
    let state = match load_state("dashboard") {
        Ok(state) => state,
        Err(failure) => return failure,
    };

    CommandResult::rendered(render(&state, Local::now().date_naive(), json_output))
}

fn render(state: &WorkflowState, today: NaiveDate, json_output: bool) -> String {
    let summary = DashboardSummary::from_state(state, today);

    if json_output {
        return serde_json::to_string_pretty(&summary).unwrap_or_else(|error| {
            format!(
                "{{\"status\":\"error\",\"summary\":\"dashboard serialization failed\",\
                 \"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
    }

    render_human(&summary, today)
}

fn render_human(summary: &DashboardSummary, today: NaiveDate) -> String {
    let followup = &summary.followup;
    let mut lines = vec![
        format!("dashboard for {today}"),
        format!("- total items: {}", summary.total_items),
        format!("- pending: {}", summary.pending),
        format!("- completed: {}", summary.completed),
        format!("- total quotation amount: {}", summary.total_revenue.normalize()),
        format!("- followups due today: {}", summary.todays_followups),
        format!("followup status ({} tracked):", followup.tracked),
    ];

    for (label, count) in [
        ("Follow Up", followup.follow_up),
        ("Order Received", followup.order_received),
        ("Not Received", followup.not_received),
        ("Need Time", followup.need_time),
    ] {
        lines.push(format!("  - {label}: {count} ({}%)", followup.percent(count)));
    }

    lines.push("stages:".to_string());
    for stage in &summary.stages {
        lines.push(format!(
            "  - {}: {} pending, {} done",
            stage.label, stage.pending, stage.history
        ));
    }

    lines.push("recent activity:".to_string());
    if summary.recent_activity.is_empty() {
        lines.push("  (none)".to_string());
    }
    for entry in &summary.recent_activity {
        lines.push(format!(
            "  - {} {}: {} [{}]",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.customer_name,
            entry.action,
            entry.stage
        ));
    }

    lines.join("\n")
}
