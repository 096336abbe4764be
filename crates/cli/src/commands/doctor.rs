use q2d_core::config::{AppConfig, LoadOptions};
use q2d_core::domain::state::WorkflowState;
use q2d_db::{connect_with_settings, RepositoryError, SqlStateStore, StateStore};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\
                 \"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_login_mode(&config));
            checks.extend(check_storage(&config));
        }
        Err(error) => {
            let reason = "configuration did not load";
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("login_mode", reason));
            checks.push(DoctorCheck::skipped("database_connectivity", reason));
            checks.push(DoctorCheck::skipped("saved_state", reason));
        }
    }

    summarize(checks)
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_login_mode(config: &AppConfig) -> DoctorCheck {
    let details = if config.auth.allow_any_credentials {
        "open login: any non-empty credentials sign in with the user role".to_string()
    } else {
        format!(
            "restricted login: only `{}` and `{}` may sign in",
            config.auth.admin_username, config.auth.user_username
        )
    };
    DoctorCheck::pass("login_mode", details)
}

fn check_storage(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("saved_state", "the async runtime did not start"),
            ];
        }
    };

    let storage = &config.storage;
    runtime.block_on(async {
        let pool = match connect_with_settings(
            &storage.database_url,
            storage.max_connections,
            storage.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("saved_state", "the database is unreachable"),
                ];
            }
        };

        let connectivity = DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", storage.database_url),
        );
        let store = SqlStateStore::new(pool.clone());
        let loaded = store.load(&storage.state_key).await;
        let saved_state = describe_saved_state(&storage.state_key, loaded);
        pool.close().await;

        vec![connectivity, saved_state]
    })
}

fn describe_saved_state(key: &str, loaded: Result<Option<String>, RepositoryError>) -> DoctorCheck {
    match loaded {
        Ok(Some(blob)) => match serde_json::from_str::<WorkflowState>(&blob) {
            Ok(state) => DoctorCheck::pass(
                "saved_state",
                format!(
                    "`{key}` holds {} items and {} activity entries",
                    state.items.len(),
                    state.activity_log.len()
                ),
            ),
            Err(error) => DoctorCheck::fail(
                "saved_state",
                format!("`{key}` is not valid workflow state and will be ignored: {error}"),
            ),
        },
        Ok(None) => DoctorCheck::pass("saved_state", format!("no state saved under `{key}` yet")),
        Err(RepositoryError::Database(error)) => DoctorCheck::fail(
            "saved_state",
            format!(
                "could not read saved state ({error}); run `q2d migrate` if the schema is missing"
            ),
        ),
        Err(error) => DoctorCheck::fail("saved_state", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use q2d_db::RepositoryError;

    use super::{describe_saved_state, render_human, summarize, CheckStatus, DoctorCheck};

    const KEY: &str = "q2d.workflow_state.v1";

    #[test]
    fn saved_state_reports_counts() {
        let check =
            describe_saved_state(KEY, Ok(Some("{\"items\":[],\"activityLog\":[]}".to_string())));
        assert_eq!(check.status, CheckStatus::Pass);
        assert_eq!(check.details, "`q2d.workflow_state.v1` holds 0 items and 0 activity entries");
    }

    #[test]
    fn unreadable_or_tampered_state_fails() {
        let garbage = describe_saved_state(KEY, Ok(Some("not json".to_string())));
        assert_eq!(garbage.status, CheckStatus::Fail);

        let mismatch = RepositoryError::ChecksumMismatch { key: KEY.to_string() };
        let tampered = describe_saved_state(KEY, Err(mismatch));
        assert_eq!(tampered.status, CheckStatus::Fail);
    }

    #[test]
    fn absent_state_is_fine() {
        assert_eq!(describe_saved_state(KEY, Ok(None)).status, CheckStatus::Pass);
    }

    #[test]
    fn any_non_pass_check_fails_the_report() {
        let report = summarize(vec![
            DoctorCheck::pass("config_validation", "ok"),
            DoctorCheck::skipped("saved_state", "the database is unreachable"),
        ]);
        assert_eq!(report.overall_status, CheckStatus::Fail);

        let rendered = render_human(&report);
        assert!(rendered.starts_with("doctor: one or more readiness checks failed"));
        assert!(
            rendered.contains("- [skip] saved_state: skipped because the database is unreachable")
        );
    }
}
