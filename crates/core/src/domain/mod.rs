pub mod activity;
pub mod attributes;
pub mod item;
pub mod state;
