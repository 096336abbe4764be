//! Static per-stage form and table configuration.
//!
//! Each working stage has a title (also used as the activity feed label),
//! the columns shown for pending and history rows, and the fields of its
//! update form. Column labels are resolved against an item through
//! [`Item::column_value`].

use serde::Serialize;
use serde_json::Value;

use crate::domain::attributes::ItemAttributes;
use crate::domain::item::Item;
use crate::pipeline::Stage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Number,
    Textarea,
    Date,
    Select,
    File,
    Checkbox,
    Slider,
    StarRating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub options: &'static [SelectOption],
    pub placeholder: Option<&'static str>,
}

impl FormField {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, required: false, options: &[], placeholder: None }
    }

    const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    const fn options(self, options: &'static [SelectOption]) -> Self {
        Self { options, ..self }
    }

    const fn placeholder(self, placeholder: &'static str) -> Self {
        Self { placeholder: Some(placeholder), ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StageConfig {
    pub stage: Stage,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub pending_columns: &'static [&'static str],
    pub history_columns: &'static [&'static str],
    pub form_fields: &'static [FormField],
}

impl StageConfig {
    pub fn field(&self, name: &str) -> Option<&'static FormField> {
        self.form_fields.iter().find(|field| field.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FormField> {
        self.form_fields.iter().filter(|field| field.required)
    }
}

const fn opt(label: &'static str, value: &'static str) -> SelectOption {
    SelectOption { label, value }
}

const YES_NO: &[SelectOption] = &[opt("Yes", "yes"), opt("No", "no")];

const FOLLOWUP_STATUS: &[SelectOption] = &[
    opt("Follow Up", "follow_up"),
    opt("Order Received", "order_received"),
    opt("Not Received", "not_received"),
    opt("Need Time", "need_time"),
    opt("Interested", "interested"),
    opt("Not Interested", "not_interested"),
    opt("Confirmed", "confirmed"),
];

const TIME_SLOTS: &[SelectOption] =
    &[opt("Morning", "morning"), opt("Afternoon", "afternoon"), opt("Evening", "evening")];

const INSTALL_STATUSES: &[SelectOption] =
    &[opt("Completed", "completed"), opt("Partial", "partial"), opt("Pending", "pending")];

const PAYMENT_MODES: &[SelectOption] =
    &[opt("Cash", "cash"), opt("UPI", "upi"), opt("Bank Transfer", "bank")];

const REMARK: FormField =
    FormField::new("remark", "Remark", FieldKind::Textarea).placeholder("Add remarks...");

pub static STAGE_CONFIGS: [StageConfig; 12] = [
    StageConfig {
        stage: Stage::Followup,
        title: "Followup Customer",
        subtitle: "Manage pending and completed records",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Phone",
            "Location",
            "Requirement",
            "Quotation Amount",
            "Followup Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Status",
            "What did customer say?",
            "Need Call Date",
            "Remark",
        ],
        form_fields: &[
            FormField::new("status", "Status", FieldKind::Select)
                .required()
                .options(FOLLOWUP_STATUS),
            FormField::new("notes", "What did customer say?", FieldKind::Textarea)
                .placeholder("Enter customer response..."),
            FormField::new("callDate", "Need Call Date", FieldKind::Date),
            FormField::new("remark", "Remark", FieldKind::Textarea)
                .placeholder("Add any remarks..."),
        ],
    },
    StageConfig {
        stage: Stage::Stock,
        title: "Check for Delivery From Stock",
        subtitle: "Verify stock availability and delivery readiness",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Item Required",
            "Quantity",
            "Stock Available",
            "ETA",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Stock Available",
            "Available Quantity",
            "Warehouse Location",
            "Expected Dispatch Date",
            "Remark",
        ],
        form_fields: &[
            FormField::new("stockAvailable", "Stock Available", FieldKind::Select)
                .required()
                .options(YES_NO),
            FormField::new("quantity", "Available Quantity", FieldKind::Number)
                .placeholder("Enter quantity"),
            FormField::new("warehouse", "Warehouse Location", FieldKind::Text)
                .placeholder("Enter warehouse location"),
            FormField::new("dispatchDate", "Expected Dispatch Date", FieldKind::Date),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Po,
        title: "Make PO",
        subtitle: "Purchase Order creation and tracking",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Vendor Name",
            "Item Name",
            "Qty",
            "PO Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Vendor Name",
            "PO Number",
            "PO Date",
            "Expected Delivery Date",
            "Remark",
        ],
        form_fields: &[
            FormField::new("vendor", "Vendor Name", FieldKind::Text)
                .required()
                .placeholder("Enter vendor name"),
            FormField::new("poNumber", "PO Number", FieldKind::Text)
                .required()
                .placeholder("Enter PO number"),
            FormField::new("poDate", "PO Date", FieldKind::Date).required(),
            FormField::new("deliveryDate", "Expected Delivery Date", FieldKind::Date),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Delivery,
        title: "Truck Delivery",
        subtitle: "Track truck and driver information for delivery",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Truck Number",
            "Driver Name",
            "Dispatch Date",
            "Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Truck Number",
            "Driver Name",
            "Driver Contact",
            "Dispatch Date",
            "Delivery ETA",
            "Remark",
        ],
        form_fields: &[
            FormField::new("truckNumber", "Truck Number", FieldKind::Text)
                .required()
                .placeholder("Enter truck number"),
            FormField::new("driverName", "Driver Name", FieldKind::Text)
                .required()
                .placeholder("Enter driver name"),
            FormField::new("driverContact", "Driver Contact", FieldKind::Text)
                .placeholder("Enter contact number"),
            FormField::new("dispatchDate", "Dispatch Date", FieldKind::Date).required(),
            FormField::new("deliveryEta", "Delivery ETA", FieldKind::Text)
                .placeholder("Enter estimated arrival time"),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Receiving,
        title: "Receiving Stock",
        subtitle: "Record material receipt and damage assessment",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Material Name",
            "Received Qty",
            "Damage",
            "Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Received Quantity",
            "Damage",
            "Damage Notes",
            "Received Date",
            "Remark",
        ],
        form_fields: &[
            FormField::new("receivedQty", "Received Quantity", FieldKind::Number)
                .required()
                .placeholder("Enter quantity received"),
            FormField::new("hasDamage", "Damage", FieldKind::Select).required().options(YES_NO),
            FormField::new("damageNotes", "Damage Notes", FieldKind::Textarea)
                .placeholder("Describe damage if any..."),
            FormField::new("receivedDate", "Received Date", FieldKind::Date).required(),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::DispatchPlan,
        title: "Dispatch Planning for Customer",
        subtitle: "Plan dispatch schedule and team assignment",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Planned Date",
            "Time Slot",
            "Team Assigned",
            "Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Planned Dispatch Date",
            "Time Slot",
            "Team Assigned",
            "Remark",
        ],
        form_fields: &[
            FormField::new("plannedDate", "Planned Dispatch Date", FieldKind::Date).required(),
            FormField::new("timeSlot", "Time Slot", FieldKind::Select)
                .required()
                .options(TIME_SLOTS),
            FormField::new("teamAssigned", "Team Assigned", FieldKind::Text)
                .required()
                .placeholder("Enter team members"),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Dispatch,
        title: "Dispatch",
        subtitle: "Dispatch with image and video proof",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Dispatch Date",
            "Vehicle",
            "Proof Uploaded",
            "Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Dispatch Date",
            "Vehicle Number",
            "Upload Image",
            "Upload Video",
            "Remark",
        ],
        form_fields: &[
            FormField::new("dispatchDate", "Dispatch Date", FieldKind::Date).required(),
            FormField::new("vehicleNumber", "Vehicle Number", FieldKind::Text)
                .required()
                .placeholder("Enter vehicle number"),
            FormField::new("image", "Upload Image", FieldKind::File),
            FormField::new("video", "Upload Video", FieldKind::File),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Confirmation,
        title: "Receiving Confirmation",
        subtitle: "Confirm delivery and note any issues",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Delivered Date",
            "Customer Confirmation",
            "Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Delivered Date",
            "Customer Confirmation",
            "Any Issue",
            "Remark",
        ],
        form_fields: &[
            FormField::new("deliveredDate", "Delivered Date", FieldKind::Date).required(),
            FormField::new("confirmed", "Customer Confirmation", FieldKind::Select)
                .required()
                .options(YES_NO),
            FormField::new("issues", "Any Issue", FieldKind::Textarea)
                .placeholder("Describe any issues..."),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Installation,
        title: "Send to Installation",
        subtitle: "Assign installer and schedule installation",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Installer Name",
            "Installation Date",
            "Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Installer Name",
            "Installer Contact",
            "Installation Date",
            "Remark",
        ],
        form_fields: &[
            FormField::new("installerName", "Installer Name", FieldKind::Text)
                .required()
                .placeholder("Enter installer name"),
            FormField::new("installerContact", "Installer Contact", FieldKind::Text)
                .placeholder("Enter contact number"),
            FormField::new("installDate", "Installation Date", FieldKind::Date).required(),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::InstallMaterial,
        title: "Install to Material",
        subtitle: "Track installation progress and completion",
        pending_columns: &["Lead ID", "Customer Name", "Work Done %", "Installation Status"],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Work Done %",
            "Installation Status",
            "Issue Notes",
            "Remark",
        ],
        form_fields: &[
            FormField::new("workDone", "Work Done %", FieldKind::Slider),
            FormField::new("installStatus", "Installation Status", FieldKind::Select)
                .required()
                .options(INSTALL_STATUSES),
            FormField::new("issueNotes", "Issue Notes", FieldKind::Textarea)
                .placeholder("Note any issues..."),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::CustomerReview,
        title: "Customer Review",
        subtitle: "Collect customer feedback after installation",
        pending_columns: &["Lead ID", "Customer Name", "Installation Date", "Installation Status"],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Rating",
            "Feedback",
            "Would Recommend",
            "Remark",
        ],
        form_fields: &[
            FormField::new("rating", "Rating", FieldKind::StarRating).required(),
            FormField::new("feedback", "Feedback", FieldKind::Textarea)
                .placeholder("What did the customer say about the work?"),
            FormField::new("wouldRecommend", "Would Recommend", FieldKind::Checkbox),
            REMARK,
        ],
    },
    StageConfig {
        stage: Stage::Payment,
        title: "Payment Collection",
        subtitle: "Track payment status and collection",
        pending_columns: &[
            "Lead ID",
            "Customer Name",
            "Total Amount",
            "Paid Amount",
            "Balance",
            "Payment Status",
        ],
        history_columns: &[
            "Lead ID",
            "Customer Name",
            "Total Amount",
            "Paid Amount",
            "Balance",
            "Payment Mode",
            "Payment Date",
            "Transaction Reference",
        ],
        form_fields: &[
            FormField::new("paidAmount", "Paid Amount", FieldKind::Number)
                .required()
                .placeholder("Enter amount paid"),
            FormField::new("paymentMode", "Payment Mode", FieldKind::Select)
                .required()
                .options(PAYMENT_MODES),
            FormField::new("paymentDate", "Payment Date", FieldKind::Date).required(),
            FormField::new("reference", "Transaction Reference", FieldKind::Text)
                .placeholder("Enter reference number"),
            REMARK,
        ],
    },
];

/// Form configuration for a working stage; `None` for the terminal marker.
pub fn stage_config(stage: Stage) -> Option<&'static StageConfig> {
    STAGE_CONFIGS.iter().find(|config| config.stage == stage)
}

/// Required fields of `config` that `data` leaves unset, in form order.
pub fn missing_required_fields(config: &StageConfig, data: &ItemAttributes) -> Vec<String> {
    let set = data.set_fields();
    config
        .required_fields()
        .filter(|field| !set.iter().any(|name| name == field.name))
        .map(|field| field.name.to_string())
        .collect()
}

/// Item property behind a table column label. Labels without an entry fall
/// back to their snake_case spelling, which normally resolves to nothing.
fn column_key(label: &str) -> String {
    let key = match label {
        "Lead ID" => "id",
        "Customer Name" => "customerName",
        "Phone" => "phone",
        "Location" => "siteLocation",
        "Requirement" | "Item Required" | "Item Name" | "Material Name" => "requirement",
        "Quotation Amount" | "Total Amount" => "quotationAmount",
        "Qty" | "Quantity" | "Available Quantity" => "quantity",
        "Received Qty" | "Received Quantity" => "receivedQty",
        "Work Done %" => "workDone",
        "Paid Amount" => "paidAmount",
        "Balance" => "balance",
        "Status" | "Followup Status" => "status",
        "What did customer say?" => "notes",
        "Need Call Date" => "callDate",
        "Upload Image" => "image",
        "Upload Video" => "video",
        "Remark" => "remark",
        "Stock Available" => "stockAvailable",
        "Warehouse Location" => "warehouse",
        "Expected Dispatch Date" | "Dispatch Date" => "dispatchDate",
        "Vendor Name" => "vendor",
        "PO Number" => "poNumber",
        "PO Date" => "poDate",
        "Expected Delivery Date" => "deliveryDate",
        "Truck Number" => "truckNumber",
        "Driver Name" => "driverName",
        "Driver Contact" => "driverContact",
        "Delivery ETA" => "deliveryEta",
        "Damage" => "hasDamage",
        "Damage Notes" => "damageNotes",
        "Received Date" => "receivedDate",
        "Planned Date" | "Planned Dispatch Date" => "plannedDate",
        "Time Slot" => "timeSlot",
        "Team Assigned" => "teamAssigned",
        "Vehicle" | "Vehicle Number" => "vehicleNumber",
        "Delivered Date" => "deliveredDate",
        "Customer Confirmation" => "confirmed",
        "Any Issue" => "issues",
        "Installer Name" => "installerName",
        "Installer Contact" => "installerContact",
        "Installation Date" => "installDate",
        "Installation Status" => "installStatus",
        "Issue Notes" => "issueNotes",
        "Rating" => "rating",
        "Feedback" => "feedback",
        "Would Recommend" => "wouldRecommend",
        "Payment Mode" => "paymentMode",
        "Payment Date" => "paymentDate",
        "Transaction Reference" => "reference",
        other => return other.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_"),
    };
    key.to_string()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::String(text) if text.is_empty() => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Array(values) => {
            let parts: Vec<String> = values
                .iter()
                .map(|value| match value.get("name") {
                    Some(name) => render_value(name),
                    None => render_value(value),
                })
                .collect();
            if parts.is_empty() {
                "-".to_string()
            } else {
                parts.join(", ")
            }
        }
        Value::Object(_) => value.to_string(),
    }
}

impl Item {
    /// Display text for a table column; `-` when the item has no value.
    pub fn column_value(&self, label: &str) -> String {
        let key = column_key(label);
        let money = match key.as_str() {
            "balance" => Some(self.balance()),
            "quotationAmount" => Some(self.quotation_amount),
            "paidAmount" => Some(self.attributes.paid_amount),
            _ => None,
        };
        if let Some(amount) = money {
            return amount
                .map(|value| value.normalize().to_string())
                .unwrap_or_else(|| "-".to_string());
        }

        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => {
                map.get(&key).map(render_value).unwrap_or_else(|| "-".to_string())
            }
            _ => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{missing_required_fields, stage_config, FieldKind, STAGE_CONFIGS};
    use crate::domain::attributes::{FileRef, FollowupStatus, ItemAttributes, YesNo};
    use crate::domain::item::{Item, ItemId};
    use crate::pipeline::{Stage, PIPELINE};

    #[test]
    fn every_working_stage_has_one_config() {
        for stage in PIPELINE {
            let config = stage_config(stage).expect("config for working stage");
            assert_eq!(config.stage, stage);
            assert!(!config.form_fields.is_empty());
            assert_eq!(config.history_columns[0], "Lead ID");
        }
        assert_eq!(STAGE_CONFIGS.len(), PIPELINE.len());
        assert!(stage_config(Stage::Completed).is_none());
    }

    #[test]
    fn select_fields_carry_options() {
        for config in STAGE_CONFIGS.iter() {
            for field in config.form_fields {
                assert_eq!(
                    field.kind == FieldKind::Select,
                    !field.options.is_empty(),
                    "options mismatch on {}",
                    field.name
                );
            }
        }
    }

    #[test]
    fn customer_review_uses_star_rating_and_checkbox() {
        let config = stage_config(Stage::CustomerReview).expect("customer review config");
        assert_eq!(config.field("rating").map(|f| f.kind), Some(FieldKind::StarRating));
        assert_eq!(config.field("wouldRecommend").map(|f| f.kind), Some(FieldKind::Checkbox));
    }

    #[test]
    fn missing_required_fields_lists_unset_fields_in_form_order() {
        let config = stage_config(Stage::Po).expect("po config");
        let data = ItemAttributes {
            po_number: Some("PO-7".to_string()),
            ..ItemAttributes::default()
        };
        assert_eq!(missing_required_fields(config, &data), vec!["vendor", "poDate"]);

        let complete = ItemAttributes {
            vendor: Some("Urban Woods".to_string()),
            po_number: Some("PO-7".to_string()),
            po_date: NaiveDate::from_ymd_opt(2024, 1, 9),
            ..ItemAttributes::default()
        };
        assert!(missing_required_fields(config, &complete).is_empty());
    }

    #[test]
    fn column_values_render_item_properties() {
        let mut item = Item::new(ItemId::from("LEAD-9"), "Sita Ram", "9000000009", "Kolkata");
        item.requirement = Some("Bookshelf".to_string());
        item.quotation_amount = Some(Decimal::new(120_000, 0));
        item.attributes.status = Some(FollowupStatus::NeedTime);
        item.attributes.paid_amount = Some(Decimal::new(20_000, 0));
        item.attributes.has_damage = Some(YesNo::No);
        item.attributes.would_recommend = Some(true);
        item.attributes.image = Some(vec![
            FileRef { name: "front.jpg".to_string(), url: "blob:1".to_string() },
            FileRef { name: "back.jpg".to_string(), url: "blob:2".to_string() },
        ]);

        assert_eq!(item.column_value("Lead ID"), "LEAD-9");
        assert_eq!(item.column_value("Location"), "Kolkata");
        assert_eq!(item.column_value("Item Name"), "Bookshelf");
        assert_eq!(item.column_value("Total Amount"), "120000");
        assert_eq!(item.column_value("Balance"), "100000");
        assert_eq!(item.column_value("Followup Status"), "need_time");
        assert_eq!(item.column_value("Damage"), "no");
        assert_eq!(item.column_value("Would Recommend"), "Yes");
        assert_eq!(item.column_value("Upload Image"), "front.jpg, back.jpg");
        assert_eq!(item.column_value("Vendor Name"), "-");
        assert_eq!(item.column_value("Proof Uploaded"), "-");
    }
}
