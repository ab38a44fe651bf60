//! Page-level guard.

use std::sync::Arc;

use propdesk_core::{GuardPhase, NavigationKind, RouteClass, classify, decide};
use propdesk_session::AuthState;

pub const CHECKING_MESSAGE: &str = "Checking authentication...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    Checking,
    /// A redirect was issued; nothing is rendered.
    Redirecting,
    Content,
}

impl PageView {
    /// Text shown for this view, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            PageView::Checking => Some(CHECKING_MESSAGE),
            _ => None,
        }
    }
}

/// A wrapped page always needs a session, even outside the role tree.
fn page_class(path: &str) -> RouteClass {
    match classify(path) {
        RouteClass::Public | RouteClass::Bypass => RouteClass::Dashboard(None),
        class => class,
    }
}

#[derive(Debug, Clone)]
pub struct PageGuard {
    auth: Arc<AuthState>,
}

impl PageGuard {
    pub fn new(auth: Arc<AuthState>) -> Self {
        Self { auth }
    }

    /// Guard phase for the current path, without side effects.
    pub fn phase(&self) -> GuardPhase {
        let snapshot = self.auth.snapshot();
        if snapshot.is_loading {
            return GuardPhase::Checking;
        }

        let path = self.auth.navigator().current_path();
        decide(&snapshot.view(), &page_class(&path)).into()
    }

    /// Renders the page, redirecting when the policy says so.
    pub fn render(&self) -> PageView {
        let target = match self.phase() {
            GuardPhase::Checking => return PageView::Checking,
            GuardPhase::Allowed => return PageView::Content,
            GuardPhase::RedirectToRoot => "/".to_string(),
            GuardPhase::RedirectToRoleHome(role) => role.dashboard_path(),
        };

        self.auth
            .navigator()
            .navigate(&target, NavigationKind::Replace);
        PageView::Redirecting
    }
}
