//! The signed-in user as the backend describes it.

use propdesk_core::RoleTag;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::SessionError;

/// An entry of `user.roles`. The backend sends objects, older payloads send
/// bare slugs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Slug(String),
    Detailed {
        #[serde(default)]
        slug: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl RoleRef {
    pub fn slug(&self) -> Option<&str> {
        match self {
            RoleRef::Slug(slug) => Some(slug),
            RoleRef::Detailed { slug, .. } => slug.as_deref(),
        }
    }
}

/// User payload. Fields PropDesk does not read are kept in `extra` so the
/// persisted JSON round-trips.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_role"
    )]
    pub role: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_lenient_roles"
    )]
    pub roles: Vec<RoleRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `role` may be a slug or a `{slug}` object. Anything else reads as absent.
fn deserialize_lenient_role<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(slug) => Some(slug),
        Value::Object(map) => map.get("slug").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

/// A malformed `roles` reads as empty. Malformed entries keep their position
/// with no slug, so `roles[0]` still means the first entry sent.
fn deserialize_lenient_roles<'de, D>(deserializer: D) -> Result<Vec<RoleRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value(entry).unwrap_or(RoleRef::Detailed {
                slug: None,
                name: None,
            })
        })
        .collect())
}

impl UserRecord {
    /// Role from `roles[0].slug`.
    pub fn primary_role(&self) -> Option<RoleTag> {
        self.roles
            .first()
            .and_then(RoleRef::slug)
            .and_then(RoleTag::parse)
    }

    /// Role from the flat `role` field.
    pub fn role_field(&self) -> Option<RoleTag> {
        self.role.as_deref().and_then(RoleTag::parse)
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown user")
    }

    /// Accepts a bare user object or a `{user: {...}}` wrapper, as handed to
    /// `AuthState::set_authenticated`.
    pub fn from_payload(payload: &Value) -> Result<Self, SessionError> {
        let candidate = match payload.get("user") {
            Some(user) if user.is_object() => user,
            _ => payload,
        };

        if !candidate.is_object() {
            return Err(SessionError::InvalidUserData);
        }
        decode(candidate)
    }
}

/// The response shape a user was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEnvelope {
    /// `{data: {user: {...}}}`
    Nested,
    /// `{user: {...}}`
    Wrapped,
    /// `{id, email, ...}`
    Bare,
}

/// Decodes the user-info response, trying the shapes in a fixed order.
///
/// # Errors
///
/// `SessionError::InvalidUserData` when no shape matches or the matched
/// object is not a user.
pub fn decode_user(body: &Value) -> Result<(UserRecord, UserEnvelope), SessionError> {
    if let Some(user) = body
        .get("data")
        .and_then(|data| data.get("user"))
        .filter(|user| user.is_object())
    {
        return Ok((decode(user)?, UserEnvelope::Nested));
    }

    if let Some(user) = body.get("user").filter(|user| user.is_object()) {
        return Ok((decode(user)?, UserEnvelope::Wrapped));
    }

    let identified = ["id", "email"]
        .iter()
        .any(|key| body.get(key).is_some_and(|v| !v.is_null()));
    if body.is_object() && identified {
        return Ok((decode(body)?, UserEnvelope::Bare));
    }

    Err(SessionError::InvalidUserData)
}

fn decode(value: &Value) -> Result<UserRecord, SessionError> {
    serde_json::from_value(value.clone()).map_err(|e| {
        tracing::debug!(error = %e, "User payload did not decode");
        SessionError::InvalidUserData
    })
}
