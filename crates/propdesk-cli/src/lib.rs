//! # PropDesk CLI
//!
//! Operator tooling that drives the same session code as the dashboards:
//!
//! - `login`: sign in and persist the session under `SESSION_STORAGE_DIR`
//! - `whoami`: verify the stored session against the backend
//! - `logout`: end the session
//! - `request`: issue an authenticated call to the REST backend

pub mod commands;
pub mod form;
