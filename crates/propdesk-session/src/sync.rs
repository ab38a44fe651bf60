//! Cross-tab session sync.
//!
//! A tab logs itself out when the token disappears from storage while it
//! still believes it is signed in. Writes made through the shared
//! `TokenStorage` arrive as storage events; anything else (another process
//! editing the same store) is caught by polling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use propdesk_core::NavigationKind;
use propdesk_core::route::is_dashboard_path;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::AuthState;
use crate::tokens::TOKEN_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    InSync,
    /// The tab was signed out; `redirected` when it was on a dashboard page
    /// and got sent to `/`.
    LoggedOut { redirected: bool },
    /// The loss was already handled by an earlier check.
    AlreadyHandled,
}

/// `tokio::time::interval` rejects a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct SessionSync {
    auth: Arc<AuthState>,
    poll_interval: Duration,
    loss_handled: AtomicBool,
}

impl SessionSync {
    pub fn new(auth: Arc<AuthState>, poll_interval: Duration) -> Self {
        Self {
            auth,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            loss_handled: AtomicBool::new(false),
        }
    }

    /// Compares storage with the holder and signs the tab out if the token
    /// is gone. Fires at most once per lost token.
    pub fn check(&self) -> SyncOutcome {
        if self.auth.storage().read_token().is_some() {
            self.loss_handled.store(false, Ordering::SeqCst);
            return SyncOutcome::InSync;
        }

        if !self.auth.is_authenticated() {
            return SyncOutcome::InSync;
        }

        if self
            .loss_handled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SyncOutcome::AlreadyHandled;
        }

        info!("Token removed in another tab, signing out");
        self.auth.clear_auth();

        let navigator = self.auth.navigator();
        let redirected = is_dashboard_path(&navigator.current_path());
        if redirected {
            navigator.navigate("/", NavigationKind::Replace);
        }

        SyncOutcome::LoggedOut { redirected }
    }

    /// Runs the sync in the background until the handle is stopped or
    /// dropped.
    pub fn start(self: Arc<Self>) -> SyncHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut events = self.auth.storage().subscribe();

        let task = tokio::spawn(async move {
            self.check();

            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.check();
                    }
                    event = events.recv() => match event {
                        Ok(event) if event.key == TOKEN_KEY => {
                            self.check();
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Storage events lagged, re-checking");
                            self.check();
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            debug!("Session sync stopped");
        });

        SyncHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owns a running sync. Dropping it stops the task.
#[derive(Debug)]
pub struct SyncHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stops the sync and waits for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
