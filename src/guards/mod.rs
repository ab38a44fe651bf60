//! In-tab route guards.
//!
//! These run against a tab's [`AuthState`](propdesk_session::AuthState)
//! rather than cookies, so they see the full session.
//!
//! - [`layout`]: Per-role layout guard; waits for the auth check to settle
//! - [`page`]: Per-page guard with the "Checking authentication..." placeholder
//!
//! Both apply the same `decide` policy as the edge middleware.

pub mod layout;
pub mod page;

pub use layout::{LayoutGuard, LayoutView};
pub use page::{CHECKING_MESSAGE, PageGuard, PageView};
