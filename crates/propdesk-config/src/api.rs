//! Backend API client configuration.
//!
//! # Environment Variables
//!
//! - `API_BASE_URL`: Backend base URL (falls back to `NEXT_PUBLIC_API_BASE_URL`,
//!   default `http://localhost:8000/api`)
//! - `API_TIMEOUT_MS`: Default per-request timeout (default: 30000)
//! - `API_SHOW_PROGRESS`: Whether requests drive the progress bar unless told
//!   otherwise (default: true)
//! - `AUTH_FORBIDDEN_POLICY`: What a 403 does, `surface` or `logout`
//!   (default: `surface`)

use std::env;
use std::str::FromStr;

use crate::env_or;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// What the client does with a 403 response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ForbiddenPolicy {
    /// Return the error to the caller; session state is untouched.
    #[default]
    Surface,
    /// Treat it like a 401: drop the token and go back to `/`.
    Logout,
}

impl FromStr for ForbiddenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "surface" => Ok(ForbiddenPolicy::Surface),
            "logout" => Ok(ForbiddenPolicy::Logout),
            other => Err(format!("unknown forbidden policy: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub show_progress: bool,
    pub forbidden_policy: ForbiddenPolicy,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("API_BASE_URL")
            .or_else(|_| env::var("NEXT_PUBLIC_API_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: env_or("API_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            show_progress: env_or("API_SHOW_PROGRESS", true),
            forbidden_policy: env_or("AUTH_FORBIDDEN_POLICY", ForbiddenPolicy::default()),
        }
    }

    /// Config pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            show_progress: true,
            forbidden_policy: ForbiddenPolicy::Surface,
        }
    }
}
