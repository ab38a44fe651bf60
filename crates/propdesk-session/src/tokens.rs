//! Token and role storage.
//!
//! `TokenStorage` is the only write path for the session. It keeps the local
//! store and the cookie mirror behind one lock and announces every write on
//! a broadcast channel, which is how other "tabs" in the process notice.

use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;
use propdesk_client::TokenSource;
use propdesk_config::SessionConfig;
use propdesk_core::{NavigationKind, Navigator, RoleTag};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cookies::{Cookie, CookieJar};
use crate::storage::{KeyValueStore, MemoryStore, StorageError};
use crate::user::UserRecord;

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "auth_user";
pub const ROLE_KEY: &str = "user_role";
pub const REMEMBER_ME_KEY: &str = "remember_me";

/// Every key the session owns in the local store.
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, USER_KEY, ROLE_KEY, REMEMBER_ME_KEY];

/// Keys that are also mirrored as cookies.
const COOKIE_KEYS: [&str; 2] = [TOKEN_KEY, ROLE_KEY];

const EVENT_CAPACITY: usize = 64;

/// A write made through a `TokenStorage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

/// Both mirrors read under one lock.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorSnapshot {
    pub local_token: Option<String>,
    pub cookie_token: Option<String>,
    pub local_role: Option<String>,
    pub cookie_role: Option<String>,
}

impl MirrorSnapshot {
    /// True when the cookie mirror agrees with the local store.
    pub fn is_consistent(&self) -> bool {
        self.local_token == self.cookie_token && self.local_role == self.cookie_role
    }
}

struct Mirrors {
    local: Box<dyn KeyValueStore>,
    cookies: CookieJar,
}

impl Mirrors {
    fn read(&self, key: &str) -> Option<String> {
        match self.local.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read local storage");
                None
            }
        }
    }
}

pub struct TokenStorage {
    mirrors: Mutex<Mirrors>,
    events: broadcast::Sender<StorageEvent>,
    cookie_max_age: Duration,
}

impl std::fmt::Debug for TokenStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStorage")
            .field("cookie_max_age", &self.cookie_max_age)
            .finish_non_exhaustive()
    }
}

impl TokenStorage {
    pub fn new(local: impl KeyValueStore + 'static, config: &SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            mirrors: Mutex::new(Mirrors {
                local: Box::new(local),
                cookies: CookieJar::new(),
            }),
            events,
            cookie_max_age: Duration::days(config.cookie_max_age_days()),
        }
    }

    /// Process-local storage with default settings.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), &SessionConfig::default())
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.write(TOKEN_KEY, Some(token))
    }

    pub fn clear_token(&self) -> Result<(), StorageError> {
        self.write(TOKEN_KEY, None)
    }

    pub fn read_token(&self) -> Option<String> {
        self.mirrors.lock().read(TOKEN_KEY)
    }

    pub fn set_role(&self, role: RoleTag) -> Result<(), StorageError> {
        self.write(ROLE_KEY, Some(role.as_str()))
    }

    pub fn clear_role(&self) -> Result<(), StorageError> {
        self.write(ROLE_KEY, None)
    }

    /// The stored role tag. Values outside the closed set read as absent.
    pub fn read_role(&self) -> Option<RoleTag> {
        let raw = self.mirrors.lock().read(ROLE_KEY)?;
        let role = RoleTag::parse(&raw);
        if role.is_none() {
            debug!(value = %raw, "Ignoring unknown stored role");
        }
        role
    }

    pub fn set_user(&self, user: &UserRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(user)?;
        self.write(USER_KEY, Some(&json))
    }

    /// The persisted user. Unreadable JSON reads as absent.
    pub fn read_user(&self) -> Option<UserRecord> {
        let raw = self.mirrors.lock().read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored user");
                None
            }
        }
    }

    pub fn set_remember_me(&self, remember: bool) -> Result<(), StorageError> {
        self.write(REMEMBER_ME_KEY, Some(if remember { "true" } else { "false" }))
    }

    pub fn remember_me(&self) -> bool {
        self.mirrors.lock().read(REMEMBER_ME_KEY).as_deref() == Some("true")
    }

    /// Removes every session key from the local store and expires the
    /// cookies. Stops at the first failing key.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        for key in SESSION_KEYS {
            self.write(key, None)?;
        }
        Ok(())
    }

    /// Re-mirrors the local token and role into the cookie jar.
    pub fn sync_cookies(&self) {
        let mut mirrors = self.mirrors.lock();
        for key in COOKIE_KEYS {
            let cookie = match mirrors.read(key) {
                Some(value) => Cookie::new(key, value, self.cookie_max_age),
                None => Cookie::expired(key),
            };
            mirrors.cookies.set(cookie);
        }
        debug!("Cookie mirror synced from local storage");
    }

    /// The stored cookie for `name`, including expired ones.
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.mirrors.lock().cookies.get(name).cloned()
    }

    /// Drops a cookie as if the browser had evicted it. The local store is
    /// untouched.
    pub fn evict_cookie(&self, name: &str) {
        self.mirrors.lock().cookies.evict(name);
    }

    /// The `Cookie` header a request from this tab would carry.
    pub fn cookie_header(&self) -> String {
        self.mirrors.lock().cookies.header()
    }

    pub fn snapshot(&self) -> MirrorSnapshot {
        let mirrors = self.mirrors.lock();
        MirrorSnapshot {
            local_token: mirrors.read(TOKEN_KEY),
            cookie_token: mirrors.cookies.value(TOKEN_KEY).map(str::to_string),
            local_role: mirrors.read(ROLE_KEY),
            cookie_role: mirrors.cookies.value(ROLE_KEY).map(str::to_string),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        {
            let mut mirrors = self.mirrors.lock();
            match value {
                Some(v) => mirrors.local.set(key, v)?,
                None => mirrors.local.remove(key)?,
            }

            if COOKIE_KEYS.contains(&key) {
                let cookie = match value {
                    Some(v) => Cookie::new(key, v, self.cookie_max_age),
                    None => Cookie::expired(key),
                };
                mirrors.cookies.set(cookie);
            }
        }

        // No subscribers is fine.
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value: value.map(str::to_string),
        });
        Ok(())
    }
}

/// Bearer-token source for the API client, backed by `TokenStorage`.
///
/// A rejected session drops the token and forces a full reload of `/`.
pub struct SessionTokens {
    storage: Arc<TokenStorage>,
    navigator: Arc<dyn Navigator>,
}

impl SessionTokens {
    pub fn new(storage: Arc<TokenStorage>, navigator: Arc<dyn Navigator>) -> Self {
        Self { storage, navigator }
    }
}

impl TokenSource for SessionTokens {
    fn token(&self) -> Option<String> {
        self.storage.read_token()
    }

    fn on_unauthorized(&self) {
        if let Err(e) = self.storage.clear_token() {
            warn!(error = %e, "Failed to clear rejected token");
        }
        info!("Session expired, reloading at /");
        self.navigator.navigate("/", NavigationKind::FullReload);
    }
}
