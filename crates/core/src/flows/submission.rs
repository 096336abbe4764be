use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::attributes::{FollowupStatus, ItemAttributes};
use crate::domain::item::Item;
use crate::flows::states::{ActivityPayload, AdvancePayload, StageActionPayload, WorkflowAction};
use crate::pipeline::Stage;
use crate::stages::{missing_required_fields, stage_config, FieldKind, FormField, StageConfig};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("missing required fields: {}", fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },
    #[error("stage `{stage}` has no field named `{field}`")]
    UnknownField { stage: Stage, field: String },
    #[error("invalid value `{value}` for field `{field}`: {reason}")]
    InvalidValue { field: String, value: String, reason: String },
    #[error("expected `name=value`, got `{0}`")]
    MalformedPair(String),
    #[error("stage `{0}` has no update form")]
    NoForm(Stage),
    #[error("item `{item_id}` is at stage `{current}`, not `{stage}`")]
    NotAtStage { item_id: String, stage: Stage, current: Stage },
}

/// Raw `name -> text` values as typed by an operator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Parses `name=value` pairs. Later duplicates win.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, FormError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair
                .split_once('=')
                .filter(|(name, _)| !name.trim().is_empty())
                .ok_or_else(|| FormError::MalformedPair(pair.to_string()))?;
            values.insert(name.trim(), value.trim());
        }
        Ok(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Coerces every value by the kind of its form field. Blank values count
    /// as not submitted.
    pub fn into_attributes(self, config: &StageConfig) -> Result<ItemAttributes, FormError> {
        let mut attributes = ItemAttributes::default();
        for (name, raw) in self.0 {
            let field = config.field(&name).ok_or_else(|| FormError::UnknownField {
                stage: config.stage,
                field: name.clone(),
            })?;
            if raw.is_empty() {
                continue;
            }

            let value = coerce(field, &raw)?;
            let mut single = Map::new();
            single.insert(field.name.to_string(), value);
            let parsed: ItemAttributes = serde_json::from_value(Value::Object(single))
                .map_err(|error| invalid(field, &raw, error.to_string()))?;
            attributes.merge(&parsed);
        }
        Ok(attributes)
    }
}

fn invalid(field: &FormField, raw: &str, reason: impl Into<String>) -> FormError {
    FormError::InvalidValue {
        field: field.name.to_string(),
        value: raw.to_string(),
        reason: reason.into(),
    }
}

fn coerce(field: &FormField, raw: &str) -> Result<Value, FormError> {
    match field.kind {
        FieldKind::Text | FieldKind::Textarea => Ok(Value::String(raw.to_string())),
        FieldKind::Number => number(field, raw),
        FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| Value::String(date.to_string()))
            .map_err(|_| invalid(field, raw, "expected a date as YYYY-MM-DD")),
        FieldKind::Select => field
            .options
            .iter()
            .find(|option| {
                option.value.eq_ignore_ascii_case(raw) || option.label.eq_ignore_ascii_case(raw)
            })
            .map(|option| Value::String(option.value.to_string()))
            .ok_or_else(|| {
                let allowed: Vec<&str> = field.options.iter().map(|option| option.value).collect();
                invalid(field, raw, format!("expected one of {}", allowed.join("|")))
            }),
        FieldKind::File => Ok(Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| serde_json::json!({ "name": name, "url": format!("blob:{name}") }))
                .collect(),
        )),
        FieldKind::Checkbox => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(Value::Bool(true)),
            "false" | "no" | "0" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid(field, raw, "expected yes or no")),
        },
        FieldKind::Slider => bounded_integer(field, raw, 0, 100),
        FieldKind::StarRating => bounded_integer(field, raw, 1, 5),
    }
}

/// Whole numbers stay JSON integers so counts deserialize; anything else is
/// handed over as decimal text so money keeps every digit.
fn number(field: &FormField, raw: &str) -> Result<Value, FormError> {
    let value =
        raw.parse::<Decimal>().map_err(|_| invalid(field, raw, "expected a number"))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid(field, raw, "expected zero or more"));
    }
    match value.fract().is_zero().then(|| value.to_u64()).flatten() {
        Some(whole) => Ok(Value::from(whole)),
        None => Ok(Value::String(value.to_string())),
    }
}

fn bounded_integer(field: &FormField, raw: &str, min: u64, max: u64) -> Result<Value, FormError> {
    match raw.parse::<u64>() {
        Ok(value) if (min..=max).contains(&value) => Ok(Value::from(value)),
        _ => Err(invalid(field, raw, format!("expected a whole number from {min} to {max}"))),
    }
}

/// Turns one form submission into the actions the reducer should apply.
pub struct StageSubmission;

impl StageSubmission {
    /// Validates `data` against the stage form and plans the dispatch: either
    /// an advance or, for a "stay" status, an annotation, followed in both
    /// cases by an activity entry titled after the stage.
    pub fn plan(
        item: &Item,
        stage: Stage,
        data: ItemAttributes,
    ) -> Result<Vec<WorkflowAction>, FormError> {
        let config = stage_config(stage).ok_or(FormError::NoForm(stage))?;
        if item.current_stage != stage {
            return Err(FormError::NotAtStage {
                item_id: item.id.to_string(),
                stage,
                current: item.current_stage,
            });
        }

        let missing = missing_required_fields(config, &data);
        if !missing.is_empty() {
            return Err(FormError::MissingRequiredFields { fields: missing });
        }

        let stage_action = if keeps_item_at_stage(stage, &data) {
            WorkflowAction::LogStageAction(StageActionPayload { id: item.id.clone(), stage, data })
        } else {
            WorkflowAction::Advance(AdvancePayload {
                id: item.id.clone(),
                current_stage: stage,
                data,
            })
        };

        Ok(vec![
            stage_action,
            WorkflowAction::AddActivity(ActivityPayload {
                customer_name: item.customer_name.clone(),
                action: format!("Updated in {}", config.title),
                stage: config.title.to_string(),
            }),
        ])
    }
}

/// A followup that needs another call keeps the item where it is.
pub fn keeps_item_at_stage(stage: Stage, data: &ItemAttributes) -> bool {
    stage == Stage::Followup
        && matches!(data.status, Some(FollowupStatus::FollowUp | FollowupStatus::NeedTime))
}
