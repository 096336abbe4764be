use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::pipeline::{Stage, PIPELINE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

const USER_STAGES: [Stage; 7] = [
    Stage::Followup,
    Stage::Stock,
    Stage::Receiving,
    Stage::Confirmation,
    Stage::Installation,
    Stage::InstallMaterial,
    Stage::CustomerReview,
];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Stages offered in navigation. Visibility only; the workflow itself
    /// never looks at the role.
    pub fn visible_stages(self) -> &'static [Stage] {
        match self {
            Self::Admin => &PIPELINE,
            Self::User => &USER_STAGES,
        }
    }

    pub fn can_view(self, stage: Stage) -> bool {
        self.visible_stages().contains(&stage)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("username and password are both required")]
    MissingCredentials,
    #[error("invalid username or password")]
    InvalidCredentials,
}

pub fn authenticate(
    username: &str,
    password: &str,
    config: &AuthConfig,
) -> Result<Session, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let session = |role| Session { username: username.to_string(), role };

    let accounts = [
        (&config.admin_username, &config.admin_password, Role::Admin),
        (&config.user_username, &config.user_password, Role::User),
    ];
    for (expected_user, expected_password, role) in accounts {
        if matches_pair(username, password, expected_user, expected_password.expose_secret()) {
            return Ok(session(role));
        }
    }

    if config.allow_any_credentials {
        Ok(session(Role::User))
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

// A pair with an empty configured password never matches.
fn matches_pair(username: &str, password: &str, expected_user: &str, expected_pass: &str) -> bool {
    !expected_pass.is_empty() && username == expected_user && password == expected_pass
}

#[cfg(test)]
mod tests {
    use super::{authenticate, AuthError, Role};
    use crate::config::AuthConfig;
    use crate::pipeline::{Stage, PIPELINE};

    fn config(allow_any_credentials: bool) -> AuthConfig {
        AuthConfig {
            admin_username: "admin".to_string(),
            admin_password: "s3cret".to_string().into(),
            user_username: "staff".to_string(),
            user_password: "staff-pass".to_string().into(),
            allow_any_credentials,
        }
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert_eq!(authenticate("", "x", &config(true)), Err(AuthError::MissingCredentials));
        assert_eq!(authenticate("admin", "", &config(true)), Err(AuthError::MissingCredentials));
        assert_eq!(authenticate("   ", "x", &config(true)), Err(AuthError::MissingCredentials));
    }

    #[test]
    fn configured_pairs_map_to_roles() {
        let admin = authenticate("admin", "s3cret", &config(false)).expect("admin login");
        assert_eq!(admin.role, Role::Admin);

        let staff = authenticate("staff", "staff-pass", &config(false)).expect("user login");
        assert_eq!(staff.role, Role::User);
    }

    #[test]
    fn unknown_pairs_depend_on_open_login() {
        let open = authenticate("someone@example.com", "pw", &config(true)).expect("open login");
        assert_eq!(open.role, Role::User);
        assert_eq!(open.username, "someone@example.com");

        assert_eq!(
            authenticate("admin", "wrong", &config(false)),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn wrong_admin_password_never_grants_admin() {
        let session = authenticate("admin", "wrong", &config(true)).expect("open login");
        assert_eq!(session.role, Role::User);
    }

    #[test]
    fn admins_see_every_stage_and_users_a_subset() {
        assert_eq!(Role::Admin.visible_stages(), &PIPELINE);
        assert_eq!(Role::User.visible_stages().len(), 7);
        assert!(Role::User.can_view(Stage::CustomerReview));
        assert!(!Role::User.can_view(Stage::Payment));
        assert!(!Role::User.can_view(Stage::Po));
    }
}
