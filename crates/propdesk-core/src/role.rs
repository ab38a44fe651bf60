//! Dashboard role tags.
//!
//! Every signed-in actor belongs to exactly one of three dashboards. The tag
//! selects the dashboard home, the login page and the display name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of dashboard roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RoleTag {
    #[default]
    PropertyManager,
    Owner,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl RoleTag {
    pub const ALL: [RoleTag; 3] = [RoleTag::PropertyManager, RoleTag::Owner, RoleTag::Guest];

    /// The slug used in URLs, cookies and backend payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::PropertyManager => "property-manager",
            RoleTag::Owner => "owner",
            RoleTag::Guest => "guest",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RoleTag::PropertyManager => "Property Manager",
            RoleTag::Owner => "Owner",
            RoleTag::Guest => "Guest",
        }
    }

    /// Home of the role's dashboard, e.g. `/owner/dashboard`.
    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.as_str())
    }

    pub fn login_path(&self) -> String {
        format!("/{}/login", self.as_str())
    }

    /// Lenient parse used on backend data: trims, lowercases and accepts
    /// `_` or spaces in place of `-`. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        RoleTag::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
    }

    /// Infers a role from the first segment of a URL path.
    ///
    /// ```ignore
    /// assert_eq!(RoleTag::from_path("/owner/properties/12"), Some(RoleTag::Owner));
    /// assert_eq!(RoleTag::from_path("/"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let first = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/')
            .split('/')
            .next()?;

        RoleTag::ALL.into_iter().find(|role| role.as_str() == first)
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleTag {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleTag::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}
