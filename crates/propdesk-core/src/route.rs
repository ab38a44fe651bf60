//! Route classification and the guard policy.
//!
//! The edge middleware, the role layout guard and the page guard all call
//! [`decide`]; none of them carries its own redirect rules.
//!
//! # Route classes
//!
//! | Class | Paths |
//! |-------|-------|
//! | `Bypass` | `/api/...`, `/_next/...`, `/static/...`, anything with a file extension |
//! | `Guest` | `/`, `/<role>/login`, `/<role>/signup`, `/<role>/forgot-password` |
//! | `Dashboard(Some(role))` | every other `/<role>/...` path |
//! | `Dashboard(None)` | `/dashboard/...` |
//! | `Public` | everything else |
//!
//! # Policy
//!
//! | Route | Session | Decision |
//! |-------|---------|----------|
//! | Dashboard | not authenticated | `RedirectRoot` |
//! | Dashboard(R) | authenticated, known role ≠ R | `RedirectRoleHome(role)` |
//! | Guest | authenticated | `RedirectRoleHome(role or property-manager)` |
//! | anything else | any | `Allow` |

use crate::role::RoleTag;

/// Sub-paths under a role prefix that only make sense signed out.
pub const GUEST_SUBPATHS: &[&str] = &["login", "signup", "forgot-password"];

const BYPASS_PREFIXES: &[&str] = &["/api", "/_next", "/static", "/assets"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Static assets and backend calls; never guarded.
    Bypass,
    /// Sign-in, sign-up and landing pages.
    Guest,
    /// Authenticated application pages, optionally scoped to a role.
    Dashboard(Option<RoleTag>),
    Public,
}

impl RouteClass {
    pub fn is_dashboard(&self) -> bool {
        matches!(self, RouteClass::Dashboard(_))
    }
}

/// Classifies a request path. Query strings and fragments are ignored.
pub fn classify(path: &str) -> RouteClass {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    if path.is_empty() || path == "/" {
        return RouteClass::Guest;
    }

    if BYPASS_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
    {
        return RouteClass::Bypass;
    }

    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.last().is_some_and(|last| last.contains('.')) {
        return RouteClass::Bypass;
    }

    match segments.as_slice() {
        [first, ..] if *first == "dashboard" => RouteClass::Dashboard(None),
        [first, rest @ ..] => match RoleTag::ALL.into_iter().find(|r| r.as_str() == *first) {
            Some(_) if rest.first().is_some_and(|s| GUEST_SUBPATHS.contains(s)) => {
                RouteClass::Guest
            }
            Some(role) => RouteClass::Dashboard(Some(role)),
            None => RouteClass::Public,
        },
        [] => RouteClass::Guest,
    }
}

/// True for paths that require a signed-in session.
pub fn is_dashboard_path(path: &str) -> bool {
    classify(path).is_dashboard()
}

/// The part of a session the guards look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionView {
    pub authenticated: bool,
    pub role: Option<RoleTag>,
}

impl SessionView {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(role: Option<RoleTag>) -> Self {
        Self {
            authenticated: true,
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectRoot,
    RedirectRoleHome(RoleTag),
}

impl Decision {
    /// Redirect target, `None` when the route is allowed.
    pub fn target(&self) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::RedirectRoot => Some("/".to_string()),
            Decision::RedirectRoleHome(role) => Some(role.dashboard_path()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The authorization decision shared by all guard layers.
pub fn decide(session: &SessionView, route: &RouteClass) -> Decision {
    match route {
        RouteClass::Bypass | RouteClass::Public => Decision::Allow,
        RouteClass::Dashboard(_) if !session.authenticated => Decision::RedirectRoot,
        RouteClass::Dashboard(Some(required)) => match session.role {
            Some(actual) if actual != *required => Decision::RedirectRoleHome(actual),
            // An unknown role cannot be resolved here
            _ => Decision::Allow,
        },
        RouteClass::Dashboard(None) => Decision::Allow,
        RouteClass::Guest if session.authenticated => {
            Decision::RedirectRoleHome(session.role.unwrap_or_default())
        }
        RouteClass::Guest => Decision::Allow,
    }
}

/// Per-navigation guard state: `Checking` until the session is known, then
/// one of the three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Checking,
    Allowed,
    RedirectToRoot,
    RedirectToRoleHome(RoleTag),
}

impl From<Decision> for GuardPhase {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Allow => GuardPhase::Allowed,
            Decision::RedirectRoot => GuardPhase::RedirectToRoot,
            Decision::RedirectRoleHome(role) => GuardPhase::RedirectToRoleHome(role),
        }
    }
}
