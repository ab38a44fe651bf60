/// Supplies the bearer token and reacts when the backend rejects it.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Called when a response says the session is no longer valid. The
    /// implementation drops the stored token and forces a full navigation
    /// to `/`.
    fn on_unauthorized(&self);
}

/// A fixed token with no session behind it, for scripts and one-off calls.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }

    fn on_unauthorized(&self) {
        tracing::warn!("Backend rejected the static token");
    }
}
