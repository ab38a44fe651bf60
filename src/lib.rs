//! # PropDesk
//!
//! Session and route-guard layer of the PropDesk property-management
//! dashboards. Property managers, owners and guests each get their own
//! dashboard under `/<role>/`; this crate decides who may see which page.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── propdesk-core/      # Role tags, route policy, Navigator, AppError
//! ├── propdesk-config/    # Env-driven ApiConfig, SessionConfig, ServerConfig
//! ├── propdesk-client/    # REST client: envelopes, errors, timeouts, 401 handling
//! ├── propdesk-session/   # Token storage, auth state holder, cross-tab sync
//! └── propdesk-cli/       # Operator CLI (login, whoami, logout, request)
//! src/
//! ├── middleware/         # Edge guard (cookies → 307 redirects)
//! ├── guards/             # Layout and page guards over AuthState
//! ├── pages.rs            # Route surface
//! ├── logging.rs          # Tracing setup and request logging
//! └── router.rs           # Main application router
//! ```
//!
//! ## Guard layers
//!
//! | Layer | Sees | Runs |
//! |-------|------|------|
//! | Edge | `auth_token` / `user_role` cookies | Before any handler |
//! | Layout | The tab's `AuthState` | Once the auth check settles |
//! | Page | The tab's `AuthState` | On every render |
//!
//! All three call [`propdesk_core::decide`], so they agree whenever their
//! inputs agree. They can disagree when the cookie mirror lags behind local
//! storage; the layout guard then lets the user in until the cookies are
//! synced.
//!
//! ## Quick Start
//!
//! ```bash
//! API_BASE_URL=http://localhost:8000/api
//! SERVER_PORT=3000
//! cargo run --bin propdesk
//! ```
//!
//! ## Modules
//!
//! - [`guards`]: Layout and page guards
//! - [`logging`]: Tracing subscriber and request logging middleware
//! - [`middleware`]: Edge guard
//! - [`pages`]: Page shells for the route surface
//! - [`router`]: Main application router
//! - [`state`]: Shared application state

pub mod guards;
pub mod logging;
pub mod middleware;
pub mod pages;
pub mod router;
pub mod state;

// Re-export workspace crates for convenience
pub use propdesk_client;
pub use propdesk_config;
pub use propdesk_core;
pub use propdesk_session;
