use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::repos::users::{UserRow, UserStore, user_status};

/// Closed set of roles. Stored as `USER`/`ADMIN`; the only string form the
/// authorization layer ever compares against is `authority()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// The single mapping from role to authority string.
    pub fn authority(self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    /// Accepts the stored form with or without the legacy `ROLE_` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("ROLE_").unwrap_or(s) {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved identity acting for the current request.
/// Built fresh from the user store on every request, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub enabled: bool,
}

impl Principal {
    pub fn authority(&self) -> &'static str {
        self.role.authority()
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("user does not exist")]
    NotFound,
    #[error("account is disabled")]
    Disabled,
    #[error("unrecognized role `{0}`")]
    UnknownRole(String),
    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Loads a user record and promotes it into an authenticated [`Principal`].
pub struct PrincipalResolver {
    users: Arc<dyn UserStore>,
}

impl PrincipalResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn resolve_by_username(&self, username: &str) -> Result<Principal, ResolveError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(ResolveError::NotFound)?;
        Self::to_principal(user)
    }

    pub async fn resolve_by_user_id(&self, id: i64) -> Result<Principal, ResolveError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ResolveError::NotFound)?;
        Self::to_principal(user)
    }

    fn to_principal(user: UserRow) -> Result<Principal, ResolveError> {
        if user.status != user_status::ACTIVE {
            return Err(ResolveError::Disabled);
        }
        let role = user
            .role
            .parse()
            .map_err(|_| ResolveError::UnknownRole(user.role.clone()))?;

        Ok(Principal {
            user_id: user.id,
            username: user.username,
            role,
            enabled: true,
        })
    }
}
