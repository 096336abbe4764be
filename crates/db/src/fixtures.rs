use chrono::{Duration, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;

use q2d_core::domain::attributes::{
    FollowupStatus, InstallStatus, ItemAttributes, PaymentMode, TimeSlot, YesNo,
};
use q2d_core::domain::item::{Item, ItemId};
use q2d_core::flows::{Clock, WorkflowAction};
use q2d_core::pipeline::PIPELINE;

use crate::repositories::StateStore;
use crate::store::WorkflowStore;

/// Demo items generated per working stage.
pub const ITEMS_PER_STAGE: usize = 2;

const CUSTOMER_NAMES: &[&str] = &[
    "Amit Sharma",
    "Neha Verma",
    "Rahul Singh",
    "Priya Patel",
    "Mohit Jain",
    "Gaurav Kumar",
    "Anjali Gupta",
    "Rohan Mehta",
    "Sita Ram",
    "Vikram Yadav",
];

const REQUIREMENTS: &[&str] = &[
    "Sofa Set",
    "Office Desk",
    "Dining Table",
    "Bed Frame",
    "Cabinet",
    "Chair",
    "Bookshelf",
    "Coffee Table",
];

const LOCATIONS: &[&str] =
    &["Mumbai", "Delhi", "Bangalore", "Pune", "Hyderabad", "Chennai", "Kolkata"];

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[&'static str]) -> &'static str {
    values.choose(rng).copied().unwrap_or_default()
}

fn random_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase()).collect()
}

fn random_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("9{:09}", rng.gen_range(0..1_000_000_000u32))
}

/// Two demo items sitting at each working stage, with every stage field
/// filled so tables render something for every column.
pub fn generate_dummy_items<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Vec<Item> {
    let day = |offset: i64| Some(today + Duration::days(offset));
    let mut items = Vec::with_capacity(PIPELINE.len() * ITEMS_PER_STAGE);

    for stage in PIPELINE {
        for _ in 0..ITEMS_PER_STAGE {
            let id = ItemId(format!("LEAD-{}", random_code(rng, 9)));
            let customer_name = pick(rng, CUSTOMER_NAMES);
            let phone = random_phone(rng);
            let location = pick(rng, LOCATIONS);

            let mut item = Item::new(id, customer_name, phone, location);
            item.requirement = Some(pick(rng, REQUIREMENTS).to_string());
            item.quotation_amount = Some(Decimal::from(rng.gen_range(50_000..550_000u32)));
            item.expected_delivery_date = day(10);
            item.current_stage = stage;
            item.attributes = ItemAttributes {
                status: Some(FollowupStatus::Interested),
                notes: Some("Customer is looking for premium finish".to_string()),
                call_date: day(2),
                stock_available: Some(YesNo::Yes),
                quantity: Some(rng.gen_range(1..=10)),
                warehouse: Some("Central Warehouse".to_string()),
                dispatch_date: day(5),
                vendor: Some("Global Furnishings Ltd".to_string()),
                po_number: Some(format!("PO-{}", rng.gen_range(1000..10_000))),
                po_date: day(-2),
                delivery_date: day(7),
                truck_number: Some(format!("TR-{}", rng.gen_range(1000..10_000))),
                driver_name: Some("Fast Transporters".to_string()),
                driver_contact: Some(random_phone(rng)),
                delivery_eta: Some("2:00 PM".to_string()),
                received_qty: Some(rng.gen_range(1..=10)),
                has_damage: Some(YesNo::No),
                received_date: day(1),
                planned_date: day(3),
                time_slot: Some(TimeSlot::Morning),
                team_assigned: Some("Team Alpha".to_string()),
                vehicle_number: Some("DL-01-AB-1234".to_string()),
                confirmed: Some(YesNo::Yes),
                installer_name: Some("Rajesh Kumar".to_string()),
                installer_contact: Some(random_phone(rng)),
                install_date: day(4),
                work_done: Some(0),
                install_status: Some(InstallStatus::Pending),
                paid_amount: Some(Decimal::ZERO),
                payment_mode: Some(PaymentMode::Upi),
                payment_date: day(0),
                reference: Some(format!("UPI-{}", random_code(rng, 6))),
                remark: Some("Generated dummy data".to_string()),
                ..ItemAttributes::default()
            };
            items.push(item);
        }
    }

    items
}

/// Adds generated demo items when the store holds no items yet. Returns how
/// many were added.
pub async fn seed_if_empty<S, C, R>(
    store: &mut WorkflowStore<S, C>,
    rng: &mut R,
    today: NaiveDate,
) -> usize
where
    S: StateStore,
    C: Clock,
    R: Rng + ?Sized,
{
    if !store.state().items.is_empty() {
        info!(
            event_name = "workflow.seed.skipped",
            existing_items = store.state().items.len(),
            "store already has items; skipping demo seed"
        );
        return 0;
    }

    let items = generate_dummy_items(rng, today);
    let count = items.len();
    store.dispatch_all(items.into_iter().map(WorkflowAction::AddItem)).await;
    info!(event_name = "workflow.seed.applied", items = count, "seeded demo items");
    count
}
