use std::env;
use std::fs;
use std::path::Path;

use q2d_core::config::{resolve_config_path, AppConfig};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// One inspected setting: dotted key, rendered value and the env vars that
/// can set it, most specific first.
struct ConfigField {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::rendered(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    let storage = &config.storage;
    let auth = &config.auth;
    let logging = &config.logging;

    vec![
        ConfigField {
            key_path: "storage.database_url",
            value: storage.database_url.clone(),
            env_keys: &["Q2D_STORAGE_DATABASE_URL", "Q2D_DATABASE_URL"],
        },
        ConfigField {
            key_path: "storage.max_connections",
            value: storage.max_connections.to_string(),
            env_keys: &["Q2D_STORAGE_MAX_CONNECTIONS"],
        },
        ConfigField {
            key_path: "storage.timeout_secs",
            value: storage.timeout_secs.to_string(),
            env_keys: &["Q2D_STORAGE_TIMEOUT_SECS"],
        },
        ConfigField {
            key_path: "storage.state_key",
            value: storage.state_key.clone(),
            env_keys: &["Q2D_STORAGE_STATE_KEY"],
        },
        ConfigField {
            key_path: "auth.admin_username",
            value: auth.admin_username.clone(),
            env_keys: &["Q2D_AUTH_ADMIN_USERNAME"],
        },
        ConfigField {
            key_path: "auth.admin_password",
            value: redact_secret(&auth.admin_password),
            env_keys: &["Q2D_AUTH_ADMIN_PASSWORD"],
        },
        ConfigField {
            key_path: "auth.user_username",
            value: auth.user_username.clone(),
            env_keys: &["Q2D_AUTH_USER_USERNAME"],
        },
        ConfigField {
            key_path: "auth.user_password",
            value: redact_secret(&auth.user_password),
            env_keys: &["Q2D_AUTH_USER_PASSWORD"],
        },
        ConfigField {
            key_path: "auth.allow_any_credentials",
            value: auth.allow_any_credentials.to_string(),
            env_keys: &["Q2D_AUTH_ALLOW_ANY_CREDENTIALS"],
        },
        ConfigField {
            key_path: "logging.level",
            value: logging.level.clone(),
            env_keys: &["Q2D_LOGGING_LEVEL", "Q2D_LOG_LEVEL"],
        },
        ConfigField {
            key_path: "logging.format",
            value: format!("{:?}", logging.format).to_ascii_lowercase(),
            env_keys: &["Q2D_LOGGING_FORMAT", "Q2D_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &SecretString) -> String {
    if secret.expose_secret().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
