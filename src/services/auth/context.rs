use crate::services::auth::policy::AuthzError;
use crate::services::auth::principal::{Principal, Role};

/// Per-request holder of "who is acting now".
///
/// A fresh value is inserted into the request's extensions by the
/// authentication middleware and dropped with the request, so it can never be
/// observed by (or leak into) another request. The middleware is the sole
/// writer; everything downstream only reads.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn current(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// For handlers that must act on behalf of someone.
    pub fn require_user_id(&self) -> Result<i64, AuthzError> {
        self.current()
            .map(|p| p.user_id)
            .ok_or(AuthzError::Unauthenticated("no authenticated user"))
    }

    pub fn require_username(&self) -> Result<&str, AuthzError> {
        self.current()
            .map(|p| p.username.as_str())
            .ok_or(AuthzError::Unauthenticated("no authenticated user"))
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|p| p.role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Explicit teardown (logout). Dropping the request has the same effect.
    pub fn clear(&mut self) {
        self.principal = None;
    }
}
