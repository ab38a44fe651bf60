//! The auth state holder.
//!
//! One `AuthState` per tab. It hydrates from storage when built, publishes
//! every change through a `watch` channel and is the only place that turns
//! backend answers into "signed in" or "signed out".

use std::sync::Arc;
use std::time::Duration;

use propdesk_client::{ApiClient, Method, RequestOptions};
use propdesk_config::SessionConfig;
use propdesk_core::{Navigator, RoleTag, SessionView};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::SessionError;
use crate::role::{RoleSource, derive_role, role_of_user};
use crate::tokens::TokenStorage;
use crate::user::{UserRecord, decode_user};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
    pub user: Option<UserRecord>,
    pub current_role: Option<RoleTag>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AuthSnapshot {
    /// What the route policy needs to know.
    pub fn view(&self) -> SessionView {
        SessionView {
            authenticated: self.is_authenticated,
            role: self.current_role,
        }
    }
}

pub struct AuthState {
    storage: Arc<TokenStorage>,
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    state: watch::Sender<AuthSnapshot>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthState {
    /// Builds the holder from whatever the storage already has and re-mirrors
    /// a found token into the cookies.
    pub fn new(
        storage: Arc<TokenStorage>,
        client: ApiClient,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let token = storage.read_token();
        if token.is_some() {
            storage.sync_cookies();
        }

        let (state, _) = watch::channel(AuthSnapshot {
            is_authenticated: token.is_some(),
            user: storage.read_user(),
            ..AuthSnapshot::default()
        });

        let holder = Self {
            storage,
            client,
            navigator,
            config,
            state,
        };
        holder.update(|_| {});
        holder
    }

    pub fn storage(&self) -> &Arc<TokenStorage> {
        &self.storage
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.state.borrow().user.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// The role right now. The path link of the chain is read live, so this
    /// follows navigation even without a state change.
    pub fn current_role(&self) -> Option<RoleTag> {
        self.resolve_role().map(|(role, _)| role)
    }

    /// The current role and the chain link that produced it.
    pub fn resolve_role(&self) -> Option<(RoleTag, RoleSource)> {
        let user = self.state.borrow().user.clone();
        derive_role(
            user.as_ref(),
            self.storage.read_role(),
            &self.navigator.current_path(),
        )
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        let mut snapshot = self.state.borrow().clone();
        snapshot.current_role = self.current_role();
        snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// [`check_auth_within`](Self::check_auth_within) with the configured
    /// timeout.
    pub async fn check_auth(&self) -> bool {
        self.check_auth_within(self.config.check_timeout()).await
    }

    /// Verifies the stored token against the backend.
    ///
    /// Without a token this settles to signed-out and makes no call. Only a
    /// rejected session clears state; timeouts and other failures record
    /// `error` and keep what the tab already had.
    #[instrument(skip(self), fields(timeout_ms = timeout.as_millis() as u64))]
    pub async fn check_auth_within(&self, timeout: Duration) -> bool {
        if self.storage.read_token().is_none() {
            debug!("No token stored, skipping auth check");
            self.update(|s| {
                s.is_authenticated = false;
                s.user = None;
                s.is_loading = false;
            });
            return false;
        }

        self.set_loading(true);

        match self.fetch_user(timeout).await {
            Ok(user) => match self.persist_user(&user, None) {
                Ok(()) => {
                    debug!(user = %user.display_name(), "Session verified");
                    self.update(|s| {
                        s.is_authenticated = true;
                        s.user = Some(user);
                        s.error = None;
                        s.is_loading = false;
                    });
                    true
                }
                Err(err) => {
                    self.fail(&err);
                    false
                }
            },
            Err(err) if err.is_auth_expired() => {
                info!("Backend rejected the session, clearing auth");
                self.clear_auth();
                false
            }
            Err(err) => {
                warn!(error = %err, "Auth check failed, keeping current session");
                self.fail(&err);
                false
            }
        }
    }

    /// Stores a signed-in session. `user_data` may be the user itself or a
    /// `{user: ...}` wrapper; the role falls back to the one the user
    /// carries.
    pub fn set_authenticated(
        &self,
        user_data: &Value,
        token: Option<&str>,
        role: Option<RoleTag>,
    ) -> Result<(), SessionError> {
        let user = UserRecord::from_payload(user_data)?;

        if let Some(token) = token {
            self.storage.set_token(token)?;
        }
        self.persist_user(&user, role)?;

        let has_token = self.storage.read_token().is_some();
        if !has_token {
            warn!("Session stored without a token, tab stays signed out");
        }

        info!(user = %user.display_name(), "Signed in");
        self.update(|s| {
            s.is_authenticated = has_token;
            s.user = Some(user);
            s.error = None;
            s.is_loading = false;
        });
        Ok(())
    }

    /// Forgets the session in memory and in storage.
    pub fn clear_auth(&self) {
        if let Err(e) = self.storage.clear_all() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.update(|s| *s = AuthSnapshot::default());
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|s| s.error = Some(message));
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    pub fn set_loading(&self, loading: bool) {
        self.update(|s| s.is_loading = loading);
    }

    /// Signs in with email and password.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<UserRecord, SessionError> {
        self.set_loading(true);

        let options = RequestOptions::with_method(Method::POST)
            .json(json!({ "email": email, "password": password }))
            .progress(false)
            .raw();

        let result: Result<UserRecord, SessionError> = async {
            let body = self.client.request(&self.config.login_endpoint, options).await?;
            let payload = match body.get("data") {
                Some(data) if data.is_object() => data,
                _ => &body,
            };

            let token = ["token", "access_token"]
                .iter()
                .find_map(|key| payload.get(key).and_then(Value::as_str))
                .ok_or(SessionError::MissingToken)?;

            self.set_authenticated(payload, Some(token), None)?;
            self.storage.set_remember_me(remember_me)?;
            UserRecord::from_payload(payload)
        }
        .await;

        if let Err(err) = &result {
            warn!(error = %err, "Login failed");
            self.fail(err);
        }
        result
    }

    /// Tells the backend (best effort) and clears the session.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.storage.read_token().is_some() {
            let options = RequestOptions::with_method(Method::POST)
                .notification(false)
                .progress(false);
            if let Err(e) = self.client.request(&self.config.logout_endpoint, options).await {
                debug!(error = %e, "Logout call failed, clearing session anyway");
            }
        }

        self.clear_auth();
        info!("Signed out");
    }

    async fn fetch_user(&self, timeout: Duration) -> Result<UserRecord, SessionError> {
        let call = self
            .client
            .request(&self.config.user_endpoint, RequestOptions::silent());

        let body = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(SessionError::CheckTimeout(timeout.as_millis() as u64)),
        };

        decode_user(&body).map(|(user, envelope)| {
            debug!(?envelope, "Decoded user");
            user
        })
    }

    fn persist_user(&self, user: &UserRecord, role: Option<RoleTag>) -> Result<(), SessionError> {
        self.storage.set_user(user)?;
        if let Some(role) = role.or_else(|| role_of_user(user).map(|(role, _)| role)) {
            self.storage.set_role(role)?;
        }
        Ok(())
    }

    fn fail(&self, err: &SessionError) {
        let message = err.to_string();
        self.update(|s| {
            s.error = Some(message);
            s.is_loading = false;
        });
    }

    fn update(&self, f: impl FnOnce(&mut AuthSnapshot)) {
        let stored_role = self.storage.read_role();
        let path = self.navigator.current_path();
        self.state.send_modify(|s| {
            f(s);
            s.current_role = derive_role(s.user.as_ref(), stored_role, &path).map(|(role, _)| role);
        });
    }
}
