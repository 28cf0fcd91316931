use std::sync::Arc;

use crate::session::{Session, SessionStore};
use crate::types::Role;

pub const LOGIN_ROUTE: &str = "/login";
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    RedirectLogin,
    RedirectUnauthorized,
}

impl GuardOutcome {
    /// Where the navigation ends up; `None` means stay on the requested view.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GuardOutcome::Render => None,
            GuardOutcome::RedirectLogin => Some(LOGIN_ROUTE),
            GuardOutcome::RedirectUnauthorized => Some(UNAUTHORIZED_ROUTE),
        }
    }
}

/// The decision itself, free of any store. `None` for `allowed_roles` means
/// any authenticated user may render the view.
pub fn decide(session: Option<&Session>, allowed_roles: Option<&[Role]>) -> GuardOutcome {
    let Some(session) = session else {
        return GuardOutcome::RedirectLogin;
    };
    match allowed_roles {
        Some(roles) if !roles.contains(&session.role) => GuardOutcome::RedirectUnauthorized,
        _ => GuardOutcome::Render,
    }
}

/// Role that owns a route prefix. Routes outside these prefixes are public.
pub fn route_roles(path: &str) -> Option<&'static [Role]> {
    const ROUTES: [(&str, &[Role]); 4] = [
        ("/entrepreneur", &[Role::Entrepreneur]),
        ("/investors", &[Role::Investor]),
        ("/association", &[Role::Association]),
        ("/admin", &[Role::Admin]),
    ];
    ROUTES
        .iter()
        .find(|(prefix, _)| {
            path == *prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
        .map(|(_, roles)| *roles)
}

/// Landing page after login.
pub fn home_route(role: Role) -> &'static str {
    match role {
        Role::Entrepreneur => "/entrepreneur/dashboard",
        Role::Investor => "/investors/dashboard",
        Role::Association => "/association/dashboard",
        Role::Admin => "/admin/dashboard",
    }
}

/// Guard bound to a session store. Every check reads the store afresh.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn check(&self, allowed_roles: Option<&[Role]>) -> GuardOutcome {
        let session = self.session.session();
        let outcome = decide(session.as_ref(), allowed_roles);
        tracing::debug!(?outcome, "route guard evaluated");
        outcome
    }

    /// Checks a client route, public routes render for anyone.
    pub fn check_path(&self, path: &str) -> GuardOutcome {
        match route_roles(path) {
            Some(roles) => self.check(Some(roles)),
            None => GuardOutcome::Render,
        }
    }
}
