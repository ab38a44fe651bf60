//! Which role the session acts as.

use propdesk_core::RoleTag;

use crate::user::UserRecord;

/// The link of the role chain that produced a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    /// `user.roles[0].slug`
    UserRoles,
    /// `user.role`
    UserRole,
    /// The `user_role` storage key.
    Stored,
    /// First segment of the current path.
    Path,
}

/// Role carried by the user record itself.
pub fn role_of_user(user: &UserRecord) -> Option<(RoleTag, RoleSource)> {
    user.primary_role()
        .map(|role| (role, RoleSource::UserRoles))
        .or_else(|| user.role_field().map(|role| (role, RoleSource::UserRole)))
}

/// Resolves the current role; the first link that yields a valid tag wins.
pub fn derive_role(
    user: Option<&UserRecord>,
    stored: Option<RoleTag>,
    path: &str,
) -> Option<(RoleTag, RoleSource)> {
    user.and_then(role_of_user)
        .or_else(|| stored.map(|role| (role, RoleSource::Stored)))
        .or_else(|| RoleTag::from_path(path).map(|role| (role, RoleSource::Path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: serde_json::Value) -> UserRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_roles_beat_stored_role() {
        let owner = user(json!({"id": 1, "roles": [{"slug": "owner"}]}));
        assert_eq!(
            derive_role(Some(&owner), Some(RoleTag::Guest), "/guest/dashboard"),
            Some((RoleTag::Owner, RoleSource::UserRoles))
        );
    }

    #[test]
    fn test_chain_falls_through() {
        let flat = user(json!({"id": 1, "role": "guest", "roles": [{"slug": "janitor"}]}));
        assert_eq!(
            derive_role(Some(&flat), Some(RoleTag::Owner), "/"),
            Some((RoleTag::Guest, RoleSource::UserRole))
        );

        let roleless = user(json!({"id": 1, "role": "janitor"}));
        assert_eq!(
            derive_role(Some(&roleless), Some(RoleTag::Owner), "/guest/dashboard"),
            Some((RoleTag::Owner, RoleSource::Stored))
        );

        assert_eq!(
            derive_role(None, None, "/property-manager/owners/3/edit"),
            Some((RoleTag::PropertyManager, RoleSource::Path))
        );

        assert_eq!(derive_role(None, None, "/about"), None);
    }
}
