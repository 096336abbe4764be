use q2d_core::auth::{authenticate, Session};
use q2d_core::errors::ApplicationError;
use tracing::info;

use crate::commands::{load_config, CommandResult};

pub fn run(username: &str, password: &str) -> CommandResult {
    let config = match load_config("login") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    match authenticate(username, password, &config.auth) {
        Ok(session) => {
            info!(
                event_name = "cli.login.succeeded",
                username = %session.username,
                role = session.role.as_str(),
                "signed in"
            );
            CommandResult::success("login", describe_session(&session))
        }
        Err(error) => {
            CommandResult::from_application_error("login", ApplicationError::from(error))
        }
    }
}

fn describe_session(session: &Session) -> String {
    let stages: Vec<&str> =
        session.role.visible_stages().iter().map(|stage| stage.as_str()).collect();
    format!(
        "signed in as {} ({}); visible stages: {}",
        session.username,
        session.role.as_str(),
        stages.join(", ")
    )
}
