//! Session configuration.
//!
//! # Environment Variables
//!
//! - `SESSION_COOKIE_MAX_AGE_DAYS`: Lifetime of the `auth_token` / `user_role`
//!   cookies (default: 30, 1 to 400)
//! - `SESSION_POLL_INTERVAL_MS`: Cross-tab token poll interval (default: 1000,
//!   10 to 3600000)
//! - `AUTH_CHECK_TIMEOUT_MS`: Timeout for the auth check call (default: 5000,
//!   100 to 600000)
//! - `AUTH_USER_ENDPOINT`: Current-user endpoint (default: `/auth/user`)
//! - `AUTH_LOGIN_ENDPOINT`: Login endpoint (default: `/auth/login`)
//! - `AUTH_LOGOUT_ENDPOINT`: Logout endpoint (default: `/auth/logout`)
//! - `SESSION_STORAGE_DIR`: Directory of the file-backed local store
//!   (default: `.propdesk`)

use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::{clamp_setting, env_in_range};

/// Browsers cap cookie lifetimes at 400 days.
pub const COOKIE_MAX_AGE_DAYS: RangeInclusive<i64> = 1..=400;
pub const POLL_INTERVAL_MS: RangeInclusive<u64> = 10..=3_600_000;
pub const CHECK_TIMEOUT_MS: RangeInclusive<u64> = 100..=600_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_max_age_days: i64,
    pub poll_interval_ms: u64,
    pub check_timeout_ms: u64,
    pub user_endpoint: String,
    pub login_endpoint: String,
    pub logout_endpoint: String,
    pub storage_dir: PathBuf,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            cookie_max_age_days: env_in_range(
                "SESSION_COOKIE_MAX_AGE_DAYS",
                30,
                COOKIE_MAX_AGE_DAYS,
            ),
            poll_interval_ms: env_in_range("SESSION_POLL_INTERVAL_MS", 1000, POLL_INTERVAL_MS),
            check_timeout_ms: env_in_range("AUTH_CHECK_TIMEOUT_MS", 5000, CHECK_TIMEOUT_MS),
            user_endpoint: env::var("AUTH_USER_ENDPOINT")
                .unwrap_or_else(|_| "/auth/user".to_string()),
            login_endpoint: env::var("AUTH_LOGIN_ENDPOINT")
                .unwrap_or_else(|_| "/auth/login".to_string()),
            logout_endpoint: env::var("AUTH_LOGOUT_ENDPOINT")
                .unwrap_or_else(|_| "/auth/logout".to_string()),
            storage_dir: env::var("SESSION_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".propdesk")),
        }
    }

    // The fields are public, so the accessors clamp again.

    pub fn poll_interval(&self) -> Duration {
        let ms = clamp_setting("poll_interval_ms", self.poll_interval_ms, POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    pub fn check_timeout(&self) -> Duration {
        let ms = clamp_setting("check_timeout_ms", self.check_timeout_ms, CHECK_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub fn cookie_max_age_days(&self) -> i64 {
        clamp_setting(
            "cookie_max_age_days",
            self.cookie_max_age_days,
            COOKIE_MAX_AGE_DAYS,
        )
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_max_age_days: 30,
            poll_interval_ms: 1000,
            check_timeout_ms: 5000,
            user_endpoint: "/auth/user".to_string(),
            login_endpoint: "/auth/login".to_string(),
            logout_endpoint: "/auth/logout".to_string(),
            storage_dir: PathBuf::from(".propdesk"),
        }
    }
}
