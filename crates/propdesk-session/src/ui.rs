//! Progress bar and toast state fed by the API client.

use propdesk_client::{Notice, UiFeedback};
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiSnapshot {
    /// `None` when no bar is shown.
    pub progress: Option<u8>,
    pub notice: Option<Notice>,
}

#[derive(Debug)]
pub struct UiState {
    state: watch::Sender<UiSnapshot>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        let (state, _) = watch::channel(UiSnapshot::default());
        Self { state }
    }

    pub fn snapshot(&self) -> UiSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UiSnapshot> {
        self.state.subscribe()
    }

    /// Takes the pending notice, e.g. once a toast has been shown.
    pub fn take_notice(&self) -> Option<Notice> {
        let mut taken = None;
        self.state.send_modify(|s| taken = s.notice.take());
        taken
    }
}

impl UiFeedback for UiState {
    fn progress_started(&self) {
        self.state.send_modify(|s| s.progress = Some(0));
    }

    fn progress(&self, percent: u8) {
        self.state.send_modify(|s| s.progress = Some(percent.min(100)));
    }

    fn progress_finished(&self) {
        self.state.send_modify(|s| s.progress = None);
    }

    fn notify(&self, notice: Notice) {
        self.state.send_modify(|s| s.notice = Some(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lifecycle() {
        let ui = UiState::new();
        ui.progress_started();
        ui.progress(42);
        assert_eq!(ui.snapshot().progress, Some(42));

        ui.progress_finished();
        assert_eq!(ui.snapshot().progress, None);
    }

    #[test]
    fn test_take_notice() {
        let ui = UiState::new();
        ui.notify(Notice::error("Email is taken"));

        assert_eq!(ui.take_notice(), Some(Notice::error("Email is taken")));
        assert_eq!(ui.take_notice(), None);
    }
}
