//! UI feedback hooks: the cosmetic progress bar and toast notices.
//!
//! Progress is simulated. A started request reports a random climb that
//! never reaches 90%, then jumps to 100% and clears when it settles.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(200);
const INITIAL_PERCENT: u8 = 10;
const CEILING_PERCENT: u8 = 89;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receiver of progress and notice events from the API client.
pub trait UiFeedback: Send + Sync {
    fn progress_started(&self);

    fn progress(&self, percent: u8);

    fn progress_finished(&self);

    fn notify(&self, notice: Notice);
}

/// Drives the simulated progress for one request. Stops on `finish` or when
/// dropped with the request.
pub(crate) struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
    sink: Arc<dyn UiFeedback>,
}

impl ProgressTicker {
    pub(crate) fn start(sink: Arc<dyn UiFeedback>) -> Self {
        sink.progress_started();
        sink.progress(INITIAL_PERCENT);

        let ticking = Arc::clone(&sink);
        let handle = tokio::spawn(async move {
            let mut percent = INITIAL_PERCENT;
            let mut interval = tokio::time::interval(TICK);
            interval.tick().await;

            loop {
                interval.tick().await;
                let step: u8 = rand::thread_rng().gen_range(2..=12);
                percent = percent.saturating_add(step).min(CEILING_PERCENT);
                ticking.progress(percent);
            }
        });

        Self {
            handle: Some(handle),
            sink,
        }
    }

    pub(crate) fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.sink.progress(100);
            self.sink.progress_finished();
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.sink.progress_finished();
        }
    }
}
