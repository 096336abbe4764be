use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupStatus {
    FollowUp,
    OrderReceived,
    NotReceived,
    NeedTime,
    Interested,
    NotInterested,
    Confirmed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
    #[serde(alias = "Yes")]
    Yes,
    #[serde(alias = "No")]
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    #[serde(alias = "Morning")]
    Morning,
    #[serde(alias = "Afternoon")]
    Afternoon,
    #[serde(alias = "Evening")]
    Evening,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Completed,
    Partial,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    Bank,
}

/// Reference to an uploaded file. Only the name and a transient URL are kept;
/// the bytes are never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub url: String,
}

/// Every attribute a stage form can write onto an item.
///
/// A submission is itself an `ItemAttributes` with only the submitted fields
/// set. [`ItemAttributes::merge`] overlays it onto the item: fields present in
/// the submission win, everything else is kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttributes {
    // followup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FollowupStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_date: Option<NaiveDate>,

    // stock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_available: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_date: Option<NaiveDate>,

    // po
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,

    // delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_eta: Option<String>,

    // receiving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_qty: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_damage: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_date: Option<NaiveDate>,

    // dispatch-plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_assigned: Option<String>,

    // dispatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<FileRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Vec<FileRef>>,

    // confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,

    // installation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<NaiveDate>,

    // install-material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_done: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_status: Option<InstallStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_notes: Option<String>,

    // customer-review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub would_recommend: Option<bool>,

    // payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    // shared by every stage form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

macro_rules! overlay {
    ($target:expr, $source:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$source.$field {
                $target.$field = Some(value.clone());
            }
        )+
    };
}

impl ItemAttributes {
    /// Shallow merge: every field set in `update` replaces the current value.
    pub fn merge(&mut self, update: &ItemAttributes) {
        overlay!(self, update;
            status, notes, call_date,
            stock_available, quantity, warehouse, dispatch_date,
            vendor, po_number, po_date, delivery_date,
            truck_number, driver_name, driver_contact, delivery_eta,
            received_qty, has_damage, damage_notes, received_date,
            planned_date, time_slot, team_assigned,
            vehicle_number, image, video,
            delivered_date, confirmed, issues,
            installer_name, installer_contact, install_date,
            work_done, install_status, issue_notes,
            rating, feedback, would_recommend,
            paid_amount, payment_mode, payment_date, reference,
            remark,
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Attribute looked up by its form field name (`callDate`, `poNumber`, ...).
    pub fn field(&self, name: &str) -> Option<Value> {
        self.to_map().remove(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Names of the fields that carry a value, in form-field spelling.
    pub fn set_fields(&self) -> Vec<String> {
        self.to_map().into_iter().map(|(name, _)| name).collect()
    }

    fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
