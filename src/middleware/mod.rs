//! Request middleware for the edge server.
//!
//! # Modules
//!
//! - [`edge`]: First-line route guard driven by the session cookies
//!
//! The edge guard only sees cookies. A tab whose cookie mirror lags behind
//! its local storage is redirected here and let through by the layout guard
//! once the mirror is synced; see [`crate::guards`].

pub mod edge;
