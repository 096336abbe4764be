pub mod activity;
pub mod add;
pub mod config;
pub mod dashboard;
pub mod doctor;
pub mod login;
pub mod migrate;
pub mod seed;
pub mod stage;
pub mod update;

use q2d_core::config::{AppConfig, LoadOptions, StorageConfig};
use q2d_core::domain::state::WorkflowState;
use q2d_core::errors::{ApplicationError, InterfaceError};
use q2d_db::{connect_with_settings, migrations, DbPool, SqlStateStore, WorkflowStore};
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Plain rendered output (tables, reports) for a successful command.
    pub fn rendered(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Maps an application failure through the interface layer, tagging it
    /// with a fresh correlation id that also lands in the log.
    pub fn from_application_error(command: &str, error: ApplicationError) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let interface = error.into_interface(correlation_id.as_str());
        let exit_code = match interface {
            InterfaceError::BadRequest { .. } => 6,
            InterfaceError::Unauthorized { .. } => 7,
            InterfaceError::ServiceUnavailable { .. } => 4,
            InterfaceError::Internal { .. } => 1,
        };

        warn!(
            event_name = "cli.command.failed",
            command,
            correlation_id = %correlation_id,
            error_class = interface.error_class(),
            error = %interface,
            "command failed"
        );

        Self::failure(
            command,
            interface.error_class(),
            format!("{} ({interface})", interface.user_message()),
            exit_code,
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        let message = format!("configuration issue: {error}");
        CommandResult::failure(command, "config_validation", message, 2)
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn connect_and_migrate(
    command: &str,
    storage: &StorageConfig,
) -> Result<DbPool, CommandResult> {
    let pool =
        connect_with_settings(&storage.database_url, storage.max_connections, storage.timeout_secs)
            .await
            .map_err(|error| {
                CommandResult::failure(command, "db_connectivity", error.to_string(), 4)
            })?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| CommandResult::failure(command, "migration", error.to_string(), 5))?;
    Ok(pool)
}

pub(crate) async fn open_store(
    command: &str,
    storage: &StorageConfig,
) -> Result<WorkflowStore<SqlStateStore>, CommandResult> {
    let pool = connect_and_migrate(command, storage).await?;
    Ok(WorkflowStore::open(SqlStateStore::new(pool), storage.state_key.clone()).await)
}

/// Loads config, opens the store and hands back a snapshot of the state for
/// read-only commands.
pub(crate) fn load_state(command: &str) -> Result<WorkflowState, CommandResult> {
    let config = load_config(command)?;
    let runtime = build_runtime(command)?;
    runtime.block_on(async {
        let store = open_store(command, &config.storage).await?;
        Ok(store.state().clone())
    })
}

#[cfg(test)]
mod tests {
    use q2d_core::errors::{ApplicationError, DomainError};
    use serde_json::Value;

    use super::CommandResult;

    #[test]
    fn failure_envelope_carries_error_class() {
        let result = CommandResult::failure("migrate", "migration", "boom", 5);
        let payload: Value = serde_json::from_str(&result.output).expect("json envelope");

        assert_eq!(result.exit_code, 5);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "migration");
        assert_eq!(payload["message"], "boom");
    }

    #[test]
    fn application_errors_map_to_interface_classes() {
        let result = CommandResult::from_application_error(
            "stage",
            ApplicationError::from(DomainError::UnknownStage("shipping".to_string())),
        );
        let payload: Value = serde_json::from_str(&result.output).expect("json envelope");

        assert_eq!(result.exit_code, 6);
        assert_eq!(payload["error_class"], "bad_request");
        assert!(payload["message"].as_str().is_some_and(|message| message.contains("shipping")));

        let missing = CommandResult::from_application_error(
            "update",
            ApplicationError::ItemNotFound("LEAD-404".to_string()),
        );
        assert_eq!(missing.exit_code, 6);

        let persistence = CommandResult::from_application_error(
            "update",
            ApplicationError::Persistence("disk full".to_string()),
        );
        assert_eq!(persistence.exit_code, 4);
    }
}
