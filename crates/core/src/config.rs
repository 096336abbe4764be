use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STATE_KEY: &str = "q2d.workflow_state.v1";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
    /// Key the serialized workflow state is stored under.
    pub state_key: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: SecretString,
    pub user_username: String,
    pub user_password: SecretString,
    pub allow_any_credentials: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub state_key: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub allow_any_credentials: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_url: "sqlite://q2d.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
                state_key: DEFAULT_STATE_KEY.to_string(),
            },
            auth: AuthConfig {
                admin_username: "admin".to_string(),
                admin_password: String::new().into(),
                user_username: "user".to_string(),
                user_password: String::new().into(),
                allow_any_credentials: true,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("q2d.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(storage) = patch.storage {
            if let Some(database_url) = storage.database_url {
                self.storage.database_url = database_url;
            }
            if let Some(max_connections) = storage.max_connections {
                self.storage.max_connections = max_connections;
            }
            if let Some(timeout_secs) = storage.timeout_secs {
                self.storage.timeout_secs = timeout_secs;
            }
            if let Some(state_key) = storage.state_key {
                self.storage.state_key = state_key;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(admin_username) = auth.admin_username {
                self.auth.admin_username = admin_username;
            }
            if let Some(admin_password) = auth.admin_password {
                self.auth.admin_password = secret_value(admin_password);
            }
            if let Some(user_username) = auth.user_username {
                self.auth.user_username = user_username;
            }
            if let Some(user_password) = auth.user_password {
                self.auth.user_password = secret_value(user_password);
            }
            if let Some(allow_any_credentials) = auth.allow_any_credentials {
                self.auth.allow_any_credentials = allow_any_credentials;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let database_url =
            read_env("Q2D_STORAGE_DATABASE_URL").or_else(|| read_env("Q2D_DATABASE_URL"));
        if let Some(value) = database_url {
            self.storage.database_url = value;
        }
        if let Some(value) = read_env("Q2D_STORAGE_MAX_CONNECTIONS") {
            self.storage.max_connections = parse_u32("Q2D_STORAGE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("Q2D_STORAGE_TIMEOUT_SECS") {
            self.storage.timeout_secs = parse_u64("Q2D_STORAGE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("Q2D_STORAGE_STATE_KEY") {
            self.storage.state_key = value;
        }

        if let Some(value) = read_env("Q2D_AUTH_ADMIN_USERNAME") {
            self.auth.admin_username = value;
        }
        if let Some(value) = read_env("Q2D_AUTH_ADMIN_PASSWORD") {
            self.auth.admin_password = secret_value(value);
        }
        if let Some(value) = read_env("Q2D_AUTH_USER_USERNAME") {
            self.auth.user_username = value;
        }
        if let Some(value) = read_env("Q2D_AUTH_USER_PASSWORD") {
            self.auth.user_password = secret_value(value);
        }
        if let Some(value) = read_env("Q2D_AUTH_ALLOW_ANY_CREDENTIALS") {
            self.auth.allow_any_credentials = parse_bool("Q2D_AUTH_ALLOW_ANY_CREDENTIALS", &value)?;
        }

        let log_level = read_env("Q2D_LOGGING_LEVEL").or_else(|| read_env("Q2D_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("Q2D_LOGGING_FORMAT").or_else(|| read_env("Q2D_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.storage.database_url = database_url;
        }
        if let Some(state_key) = overrides.state_key {
            self.storage.state_key = state_key;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(allow_any_credentials) = overrides.allow_any_credentials {
            self.auth.allow_any_credentials = allow_any_credentials;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_auth(&self.auth)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Config file the loader would pick up, in lookup order.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("q2d.toml"), PathBuf::from("config/q2d.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    let url = storage.database_url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "storage.database_url must be a sqlite URL \
             (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if storage.max_connections == 0 {
        return Err(ConfigError::Validation(
            "storage.max_connections must be greater than zero".to_string(),
        ));
    }

    if storage.timeout_secs == 0 || storage.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "storage.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if storage.state_key.trim().is_empty() {
        return Err(ConfigError::Validation("storage.state_key must not be empty".to_string()));
    }

    Ok(())
}

fn validate_auth(auth: &AuthConfig) -> Result<(), ConfigError> {
    if auth.admin_username.trim().is_empty() || auth.user_username.trim().is_empty() {
        return Err(ConfigError::Validation(
            "auth.admin_username and auth.user_username must not be empty".to_string(),
        ));
    }

    if auth.admin_username == auth.user_username {
        return Err(ConfigError::Validation(
            "auth.admin_username and auth.user_username must differ".to_string(),
        ));
    }

    let has_password = !auth.admin_password.expose_secret().is_empty()
        || !auth.user_password.expose_secret().is_empty();
    if !auth.allow_any_credentials && !has_password {
        return Err(ConfigError::Validation(
            "auth.allow_any_credentials is false but neither auth.admin_password nor \
             auth.user_password is set, so nobody could log in"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    auth: Option<AuthPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    database_url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
    state_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    admin_username: Option<String>,
    admin_password: Option<String>,
    user_username: Option<String>,
    user_password: Option<String>,
    allow_any_credentials: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, DEFAULT_STATE_KEY};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_use_versioned_state_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.storage.state_key == DEFAULT_STATE_KEY, "default state key")?;
        ensure(config.storage.database_url == "sqlite://q2d.db", "default database url")?;
        ensure(config.auth.allow_any_credentials, "open login by default")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_Q2D_ADMIN_PASSWORD", "from-env-secret");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("q2d.toml");
            fs::write(
                &path,
                r#"
[auth]
admin_username = "owner"
admin_password = "${TEST_Q2D_ADMIN_PASSWORD}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.auth.admin_username == "owner", "admin username should come from file")?;
            ensure(
                config.auth.admin_password.expose_secret() == "from-env-secret",
                "admin password should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_Q2D_ADMIN_PASSWORD"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("q2d.toml");
        fs::write(&path, "[storage]\ndatabase_url = \"${Q2D_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(
                result,
                Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "Q2D_TEST_UNSET_VAR"
            ),
            "unset interpolation variable should fail the load",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("Q2D_LOG_LEVEL", "warn");
        env::set_var("Q2D_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["Q2D_LOG_LEVEL", "Q2D_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("Q2D_STORAGE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("Q2D_STORAGE_STATE_KEY", "q2d.from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("q2d.toml");
            fs::write(
                &path,
                r#"
[storage]
database_url = "sqlite://from-file.db"
state_key = "q2d.from-file"
max_connections = 3

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.database_url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.storage.state_key == "q2d.from-env",
                "env state key should win over file and defaults",
            )?;
            ensure(config.storage.max_connections == 3, "file value should win over default")
        })();

        clear_vars(&["Q2D_STORAGE_DATABASE_URL", "Q2D_STORAGE_STATE_KEY"]);
        result
    }

    #[test]
    fn invalid_env_number_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("Q2D_STORAGE_MAX_CONNECTIONS", "many");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["Q2D_STORAGE_MAX_CONNECTIONS"]);

        ensure(
            matches!(
                result,
                Err(ConfigError::InvalidEnvOverride { ref key, .. })
                    if key == "Q2D_STORAGE_MAX_CONNECTIONS"
            ),
            "non-numeric max connections should be rejected",
        )
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("Q2D_AUTH_ALLOW_ANY_CREDENTIALS", "false");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("auth.allow_any_credentials")
            );
            ensure(has_message, "validation failure should mention auth.allow_any_credentials")
        })();

        clear_vars(&["Q2D_AUTH_ALLOW_ANY_CREDENTIALS"]);
        result
    }

    #[test]
    fn non_sqlite_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/q2d".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(
                result,
                Err(ConfigError::Validation(ref message))
                    if message.contains("storage.database_url")
            ),
            "postgres url should fail validation",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("Q2D_AUTH_ADMIN_PASSWORD", "hunter2-admin");
        env::set_var("Q2D_AUTH_USER_PASSWORD", "hunter2-user");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("hunter2-admin"),
                "debug output should not contain admin password",
            )?;
            ensure(!debug.contains("hunter2-user"), "debug output should not contain user password")
        })();

        clear_vars(&["Q2D_AUTH_ADMIN_PASSWORD", "Q2D_AUTH_USER_PASSWORD"]);
        result
    }
}
