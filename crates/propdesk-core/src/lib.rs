//! # PropDesk Core
//!
//! Core types shared by every PropDesk crate.
//!
//! - [`role`]: The closed set of dashboard roles and their path tables
//! - [`route`]: Route classification and the single guard decision function
//! - [`navigation`]: The `Navigator` seam and an in-memory `Location`
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use propdesk_core::route::{classify, decide, SessionView};
//! use propdesk_core::RoleTag;
//!
//! let session = SessionView::authenticated(Some(RoleTag::Owner));
//! let decision = decide(&session, &classify("/property-manager/dashboard"));
//! assert_eq!(decision.target().as_deref(), Some("/owner/dashboard"));
//! ```

pub mod errors;
pub mod navigation;
pub mod role;
pub mod route;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use navigation::{Location, Navigation, NavigationKind, Navigator};
pub use role::{RoleTag, UnknownRole};
pub use route::{Decision, GuardPhase, RouteClass, SessionView, classify, decide};
