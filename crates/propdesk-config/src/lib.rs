//! # PropDesk Config
//!
//! Configuration types for PropDesk, loaded from environment variables:
//!
//! - [`api`]: Backend base URL, request timeout, progress and 403 policy
//! - [`session`]: Cookie lifetime, sync polling, auth endpoints, storage dir
//! - [`server`]: Edge server bind address, app name and log directory
//!
//! # Example
//!
//! ```ignore
//! use propdesk_config::{ApiConfig, ServerConfig, SessionConfig};
//!
//! let api_config = ApiConfig::from_env();
//! let session_config = SessionConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod api;
pub mod server;
pub mod session;

// Re-export commonly used types at crate root
pub use api::{ApiConfig, ForbiddenPolicy};
pub use server::ServerConfig;
pub use session::SessionConfig;

use std::fmt;
use std::ops::RangeInclusive;

/// Reads and parses an environment variable, falling back to `default`
/// when it is unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable config value");
            default
        }),
        Err(_) => default,
    }
}

/// Like [`env_or`], then pulls the value into `range`.
pub(crate) fn env_in_range<T>(key: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: std::str::FromStr + PartialOrd + Copy + fmt::Display,
{
    clamp_setting(key, env_or(key, default), range)
}

pub(crate) fn clamp_setting<T>(key: &str, value: T, range: RangeInclusive<T>) -> T
where
    T: PartialOrd + Copy + fmt::Display,
{
    let clamped = if value < *range.start() {
        *range.start()
    } else if value > *range.end() {
        *range.end()
    } else {
        return value;
    };
    tracing::warn!(key, value = %value, using = %clamped, "Config value out of range");
    clamped
}
