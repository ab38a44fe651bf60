//! # PropDesk Client
//!
//! The one way PropDesk talks to its REST backend.
//!
//! - [`client`]: `ApiClient` with `request` and the `get`/`post`/`put`/`patch`/`delete` wrappers
//! - [`request`]: Per-call options, JSON and multipart bodies, URL building
//! - [`parse`]: Lenient JSON parsing for backends that leak output before the payload
//! - [`error`]: `ApiError` taxonomy (timeout, parse, HTTP, auth expired)
//! - [`feedback`]: Progress and notification hooks for the UI state
//! - [`tokens`]: Where the bearer token comes from and what a 401 does
//!
//! # Envelopes
//!
//! The backend wraps payloads as `{message?, data, meta?}` and failures as
//! `{message, errors?: {field: [messages]}}`. Unless `return_raw` is set, a
//! successful call resolves to the `data` member when there is one.
//!
//! # Example
//!
//! ```ignore
//! use propdesk_client::{ApiClient, RequestOptions};
//!
//! let client = ApiClient::new(ApiConfig::from_env(), tokens)?;
//! let owners = client
//!     .request("/owners", RequestOptions::get().param("page", 2).param("search", None::<String>))
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod feedback;
pub mod parse;
pub mod request;
pub mod tokens;

// Re-export commonly used types at crate root
pub use client::ApiClient;
pub use error::{ApiError, ValidationErrors};
pub use feedback::{Notice, NoticeLevel, UiFeedback};
pub use parse::ParseError;
pub use request::{FormData, RequestBody, RequestOptions};
pub use tokens::{StaticToken, TokenSource};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
