use axum::http::Method;
use thiserror::Error;

use crate::services::auth::context::SecurityContext;

/// Authentication level a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

/// Why an authorization check refused. Carried as an ordinary return value up
/// to the boundary handler; nothing in this module touches the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
}

#[derive(Debug)]
struct Rule {
    /// None matches every method
    method: Option<Method>,
    pattern: &'static str,
    access: Access,
}

/// Static route-policy table. First matching rule wins; anything unmatched
/// requires authentication.
#[derive(Debug)]
pub struct RoutePolicy {
    rules: Vec<Rule>,
}

impl RoutePolicy {
    pub fn blog_defaults() -> Self {
        let rule = |method: Option<Method>, pattern: &'static str, access: Access| Rule {
            method,
            pattern,
            access,
        };

        Self {
            rules: vec![
                // whitelist
                rule(Some(Method::POST), "/api/v1/auth/login", Access::Public),
                rule(Some(Method::POST), "/api/v1/auth/register", Access::Public),
                rule(Some(Method::GET), "/api/v1/health", Access::Public),
                rule(Some(Method::GET), "/api/v1/article/list", Access::Public),
                // admin surface; declared before the public detail rule so the
                // longer patterns are tried first
                rule(None, "/api/v1/article/{id}/top", Access::AdminOnly),
                rule(None, "/api/v1/article/{id}/featured", Access::AdminOnly),
                rule(Some(Method::GET), "/api/v1/article/{id}", Access::Public),
                // documentation assets
                rule(Some(Method::GET), "/doc.html", Access::Public),
                rule(Some(Method::GET), "/webjars/**", Access::Public),
                rule(Some(Method::GET), "/favicon.ico", Access::Public),
            ],
        }
    }

    pub fn required(&self, method: &Method, path: &str) -> Access {
        self.rules
            .iter()
            .find(|r| {
                r.method.as_ref().is_none_or(|m| m == method) && path_matches(r.pattern, path)
            })
            .map(|r| r.access)
            .unwrap_or(Access::Authenticated)
    }
}

/// Segment-wise match. `{name}` matches exactly one non-empty segment, a
/// trailing `/**` matches any remainder.
fn path_matches(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    }

    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if p.starts_with('{') && p.ends_with('}') {
                    if s.is_empty() {
                        return false;
                    }
                } else if p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Route-level gate. Order matters on admin routes: an anonymous caller is
/// told to authenticate, not that it lacks privileges.
pub fn authorize(access: Access, ctx: &SecurityContext) -> Result<(), AuthzError> {
    match access {
        Access::Public => Ok(()),
        Access::Authenticated => {
            if ctx.is_authenticated() {
                Ok(())
            } else {
                Err(AuthzError::Unauthenticated("authentication required"))
            }
        }
        Access::AdminOnly => {
            if !ctx.is_authenticated() {
                return Err(AuthzError::Unauthenticated("authentication required"));
            }
            if ctx.is_admin() {
                Ok(())
            } else {
                Err(AuthzError::Forbidden("admin role required"))
            }
        }
    }
}

/// Resource-ownership gate for mutating operations. The caller must have
/// loaded the resource already, so "not found" wins over "forbidden".
pub fn check_owner_or_admin(
    actor_id: i64,
    resource_owner_id: i64,
    is_admin: bool,
) -> Result<(), AuthzError> {
    if is_admin || actor_id == resource_owner_id {
        Ok(())
    } else {
        Err(AuthzError::Forbidden("not the resource owner"))
    }
}
