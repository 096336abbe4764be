pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{generate_dummy_items, seed_if_empty};
pub use repositories::{InMemoryStateStore, RepositoryError, SqlStateStore, StateStore};
pub use store::{PersistenceError, WorkflowStore};
