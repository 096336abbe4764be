use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::attributes::ItemAttributes;
use crate::pipeline::Stage;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    /// Fresh lead identifier in the `LEAD-XXXXXXXXX` shape.
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        Self(format!("LEAD-{}", &raw[..9]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Immutable record of one stage interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageLog {
    pub stage: Stage,
    pub timestamp: DateTime<Utc>,
    pub data: ItemAttributes,
}

/// One customer order tracked through the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub customer_name: String,
    pub phone: String,
    pub site_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery_date: Option<NaiveDate>,
    pub current_stage: Stage,
    #[serde(default)]
    pub stage_logs: Vec<StageLog>,
    #[serde(flatten)]
    pub attributes: ItemAttributes,
}

impl Item {
    /// New lead sitting at the first stage with no history.
    pub fn new(
        id: ItemId,
        customer_name: impl Into<String>,
        phone: impl Into<String>,
        site_location: impl Into<String>,
    ) -> Self {
        Self {
            id,
            customer_name: customer_name.into(),
            phone: phone.into(),
            site_location: site_location.into(),
            requirement: None,
            quotation_amount: None,
            expected_delivery_date: None,
            current_stage: Stage::Followup,
            stage_logs: Vec::new(),
            attributes: ItemAttributes::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.current_stage.is_terminal()
    }

    pub fn has_log_for(&self, stage: Stage) -> bool {
        self.stage_logs.iter().any(|log| log.stage == stage)
    }

    /// Quotation amount still outstanding after recorded payments. Clamps at
    /// the `Decimal` range instead of overflowing.
    pub fn balance(&self) -> Option<Decimal> {
        let quoted = self.quotation_amount?;
        Some(quoted.saturating_sub(self.attributes.paid_amount.unwrap_or(Decimal::ZERO)))
    }

    /// Case-insensitive customer name match; an empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.customer_name.to_lowercase().contains(&term)
    }

    /// Applies a stage interaction: merge the submitted data, then append it to
    /// the history as an untouched snapshot.
    pub fn record_stage_data(
        &mut self,
        stage: Stage,
        data: ItemAttributes,
        timestamp: DateTime<Utc>,
    ) {
        self.attributes.merge(&data);
        self.stage_logs.push(StageLog { stage, timestamp, data });
    }
}
