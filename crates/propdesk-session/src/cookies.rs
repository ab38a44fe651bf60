//! Cookie mirror of the session.
//!
//! The edge guard cannot read local storage, so the token and role are also
//! kept as cookies. The jar hands out only unexpired values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use urlencoding::encode;

/// `Expires` attribute format (RFC 7231 IMF-fixdate).
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub path: String,
    pub same_site: SameSite,
}

impl Cookie {
    /// A `SameSite=Lax`, `Path=/` cookie expiring `max_age` from now.
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: Utc::now() + max_age,
            path: "/".to_string(),
            same_site: SameSite::Lax,
        }
    }

    /// An empty cookie dated at the Unix epoch; it overwrites and kills any
    /// live cookie of the same name.
    pub fn expired(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            expires: DateTime::<Utc>::default(),
            path: "/".to_string(),
            same_site: SameSite::Lax,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `name=value` with the value percent-encoded, as sent on the wire.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, encode(&self.value))
    }

    /// Renders the cookie as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}; Expires={}; Path={}; SameSite={}",
            self.pair(),
            self.expires.format(EXPIRES_FORMAT),
            self.path,
            self.same_site
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `cookie`, replacing any cookie with the same name.
    pub fn set(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name.clone(), cookie);
    }

    /// Drops a cookie without leaving an expired marker behind, the way a
    /// browser evicts it.
    pub fn evict(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    /// The stored cookie, expired or not.
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    /// The value of a live cookie.
    pub fn value(&self, name: &str) -> Option<&str> {
        let now = Utc::now();
        self.cookies
            .get(name)
            .filter(|c| !c.is_expired_at(now))
            .map(|c| c.value.as_str())
    }

    /// The `Cookie` request header a browser would send with this jar.
    pub fn header(&self) -> String {
        let now = Utc::now();
        self.cookies
            .values()
            .filter(|c| !c.is_expired_at(now))
            .map(Cookie::pair)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
