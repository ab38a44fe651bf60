//! Navigation seam.
//!
//! Guards, the cross-tab sync and the API client's hard logout move the user
//! through a [`Navigator`]. [`Location`] is an in-memory history used by the
//! CLI and the tests.

use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Client-side navigation that adds a history entry.
    Push,
    /// Client-side navigation that replaces the current entry.
    Replace,
    /// Full page load; in-memory state is discarded.
    FullReload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub kind: NavigationKind,
}

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str, kind: NavigationKind);
}

/// In-memory navigator that records every navigation.
#[derive(Debug)]
pub struct Location {
    inner: Mutex<LocationInner>,
}

#[derive(Debug)]
struct LocationInner {
    current: String,
    history: Vec<Navigation>,
}

impl Location {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(LocationInner {
                current: initial.into(),
                history: Vec::new(),
            }),
        }
    }

    /// Every navigation performed so far, oldest first.
    pub fn history(&self) -> Vec<Navigation> {
        self.inner.lock().history.clone()
    }

    /// Number of recorded navigations to `path`.
    pub fn count_to(&self, path: &str) -> usize {
        self.inner
            .lock()
            .history
            .iter()
            .filter(|nav| nav.path == path)
            .count()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.inner.lock().history.last().cloned()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for Location {
    fn current_path(&self) -> String {
        self.inner.lock().current.clone()
    }

    fn navigate(&self, path: &str, kind: NavigationKind) {
        let mut inner = self.inner.lock();
        debug!(from = %inner.current, to = %path, ?kind, "Navigating");
        inner.current = path.to_string();
        inner.history.push(Navigation {
            path: path.to_string(),
            kind,
        });
    }
}
