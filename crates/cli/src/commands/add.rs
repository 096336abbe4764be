use chrono::NaiveDate;
use q2d_core::domain::item::{Item, ItemId};
use q2d_core::errors::{ApplicationError, DomainError};
use q2d_core::flows::{ActivityPayload, WorkflowAction};
use rust_decimal::Decimal;

use crate::commands::{build_runtime, load_config, open_store, CommandResult};

/// Raw values for a new lead, as typed on the command line.
#[derive(Clone, Debug, Default)]
pub struct NewItem {
    pub customer_name: String,
    pub phone: String,
    pub site_location: String,
    pub requirement: Option<String>,
    pub quotation_amount: Option<String>,
    pub expected_delivery_date: Option<String>,
}

pub fn run(new_item: NewItem) -> CommandResult {
    let item = match build_item(ItemId::generate(), new_item) {
        Ok(item) => item,
        Err(error) => return CommandResult::from_application_error("add", error),
    };

    let config = match load_config("add") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("add") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let id = item.id.clone();
    let result = runtime.block_on(async {
        let mut store = open_store("add", &config.storage).await?;
        let activity = WorkflowAction::AddActivity(ActivityPayload {
            customer_name: item.customer_name.clone(),
            action: "New lead added".to_string(),
            stage: item.current_stage.label().to_string(),
        });
        store.dispatch_all([WorkflowAction::AddItem(item), activity]).await;
        store.persist().await.map_err(|error| {
            CommandResult::from_application_error(
                "add",
                ApplicationError::Persistence(error.to_string()),
            )
        })
    });

    match result {
        Ok(()) => CommandResult::success("add", format!("added {id} at Quotation Followup")),
        Err(failure) => failure,
    }
}

fn build_item(id: ItemId, new_item: NewItem) -> Result<Item, ApplicationError> {
    let required = [
        ("customerName", &new_item.customer_name),
        ("phone", &new_item.phone),
        ("siteLocation", &new_item.site_location),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(invalid(format!("missing required values: {}", missing.join(", "))));
    }

    let mut item = Item::new(
        id,
        new_item.customer_name.trim(),
        new_item.phone.trim(),
        new_item.site_location.trim(),
    );
    item.requirement = new_item.requirement.filter(|value| !value.trim().is_empty());
    item.quotation_amount = new_item
        .quotation_amount
        .map(|raw| match raw.trim().parse::<Decimal>() {
            Ok(amount) if amount.is_sign_negative() && !amount.is_zero() => {
                Err(invalid(format!("quotation amount `{raw}` is negative")))
            }
            Ok(amount) => Ok(amount),
            Err(_) => Err(invalid(format!("quotation amount `{raw}` is not a number"))),
        })
        .transpose()?;
    item.expected_delivery_date = new_item
        .expected_delivery_date
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| invalid(format!("expected delivery date `{raw}` is not YYYY-MM-DD")))
        })
        .transpose()?;
    Ok(item)
}

fn invalid(message: String) -> ApplicationError {
    DomainError::InvariantViolation(message).into()
}
