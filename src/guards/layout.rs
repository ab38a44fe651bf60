//! Role layout guard.

use std::sync::Arc;

use propdesk_core::{Decision, NavigationKind, RoleTag, RouteClass, classify, decide};
use propdesk_session::AuthState;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutView {
    /// Sign-in pages under the role prefix, rendered without the dashboard
    /// chrome and without checks.
    Bare,
    Dashboard(RoleTag),
    Redirecting(String),
}

/// Guards every page under `/<role>/`.
#[derive(Debug, Clone)]
pub struct LayoutGuard {
    role: RoleTag,
    auth: Arc<AuthState>,
}

impl LayoutGuard {
    pub fn new(role: RoleTag, auth: Arc<AuthState>) -> Self {
        Self { role, auth }
    }

    pub fn role(&self) -> RoleTag {
        self.role
    }

    /// Mounts the layout for the current path. Waits until the holder is
    /// no longer loading, then applies the policy for this role and performs
    /// any redirect.
    pub async fn mount(&self) -> LayoutView {
        let path = self.auth.navigator().current_path();
        if is_exempt(&path) {
            return LayoutView::Bare;
        }

        let mut state = self.auth.subscribe();
        if state.wait_for(|s| !s.is_loading).await.is_err() {
            debug!("Auth state closed while waiting");
        }

        let session = self.auth.snapshot().view();
        match decide(&session, &RouteClass::Dashboard(Some(self.role))) {
            Decision::Allow => LayoutView::Dashboard(self.role),
            decision => {
                let target = decision.target().unwrap_or_else(|| "/".to_string());
                debug!(role = %self.role, path = %path, target = %target, "Layout guard redirect");
                self.auth
                    .navigator()
                    .navigate(&target, NavigationKind::Replace);
                LayoutView::Redirecting(target)
            }
        }
    }
}

/// Login, signup and password-reset pages skip the layout checks.
fn is_exempt(path: &str) -> bool {
    classify(path) == RouteClass::Guest && !path.trim_end_matches('/').is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exempt_paths() {
        assert!(is_exempt("/owner/login"));
        assert!(is_exempt("/guest/signup"));
        assert!(is_exempt("/property-manager/forgot-password"));
        assert!(!is_exempt("/"));
        assert!(!is_exempt("/owner/dashboard"));
    }
}
