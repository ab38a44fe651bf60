//! Command implementations, independent of argument parsing and prompts.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use propdesk_client::{Method, RequestOptions};
use propdesk_config::{ApiConfig, SessionConfig};
use propdesk_core::{Location, RoleTag};
use propdesk_session::{FileStore, RoleSource, Session, TokenStorage, UserRecord};
use serde_json::Value;
use tracing::info;

use crate::form::LoginForm;

/// Opens the session persisted under `storage_dir`.
pub fn open_session(
    storage_dir: &Path,
    api: ApiConfig,
    config: SessionConfig,
) -> anyhow::Result<Session> {
    let store = FileStore::open(storage_dir)
        .with_context(|| format!("Failed to open session store in {}", storage_dir.display()))?;
    let storage = Arc::new(TokenStorage::new(store, &config));
    let navigator = Arc::new(Location::default());

    Ok(Session::open(storage, api, config, navigator)?)
}

pub async fn login(session: &Session, form: &LoginForm) -> anyhow::Result<UserRecord> {
    form.check()?;

    let user = session
        .auth
        .login(&form.email, &form.password, form.remember_me)
        .await
        .context("Login failed")?;

    info!(email = %form.email, "Logged in");
    Ok(user)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhoAmI {
    pub user: UserRecord,
    pub role: Option<(RoleTag, RoleSource)>,
}

/// Verifies the stored session. `None` when there is no usable session.
pub async fn whoami(session: &Session) -> anyhow::Result<Option<WhoAmI>> {
    if !session.auth.check_auth().await {
        if let Some(error) = session.auth.error() {
            bail!("Could not verify session: {error}");
        }
        return Ok(None);
    }

    Ok(session.auth.user().map(|user| WhoAmI {
        user,
        role: session.auth.resolve_role(),
    }))
}

pub async fn logout(session: &Session) {
    session.auth.logout().await;
}

pub fn parse_method(raw: &str) -> anyhow::Result<Method> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {raw}"))
}

/// Parses `key=value`. Values that read as JSON (numbers, booleans, arrays)
/// keep their type; anything else is a string.
pub fn parse_param(raw: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Expected key=value, got {raw}");
    };
    if key.is_empty() {
        bail!("Empty parameter name in {raw}");
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub async fn request(
    session: &Session,
    method: Method,
    endpoint: &str,
    body: Option<&str>,
    params: Vec<(String, Value)>,
    raw: bool,
) -> anyhow::Result<Value> {
    let mut options = RequestOptions::with_method(method).progress(false);
    if let Some(body) = body {
        let body: Value = serde_json::from_str(body).context("Request body is not valid JSON")?;
        options = options.json(body);
    }
    for (key, value) in params {
        options = options.param(key, value);
    }
    if raw {
        options = options.raw();
    }

    Ok(session.client().request(endpoint, options).await?)
}
