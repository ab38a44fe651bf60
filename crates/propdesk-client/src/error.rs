//! Client error types.
//!
//! Every failed call resolves to exactly one [`ApiError`], carrying as much
//! of the backend payload as could be recovered.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::parse::ParseError;

/// Field name → messages, as sent in a Laravel-style `errors` member.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The call did not finish within its timeout.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// The body could not be read as JSON.
    #[error("Invalid JSON response from server: {0}")]
    Parse(#[from] ParseError),

    /// Non-2xx response.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        data: Value,
        validation_errors: Option<ValidationErrors>,
    },

    /// The backend no longer accepts the session token. The stored token has
    /// already been dropped when this is returned.
    #[error("{message}")]
    AuthExpired {
        status: u16,
        message: String,
        data: Value,
    },

    /// Transport failure before any response arrived.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The payload parsed but does not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Builds the error for a non-2xx response from its parsed body.
    pub fn from_response(status: StatusCode, data: Value) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            message: message_for(status, &data),
            validation_errors: validation_errors(&data),
            data,
        }
    }

    pub fn auth_expired(status: StatusCode, data: Value) -> Self {
        ApiError::AuthExpired {
            status: status.as_u16(),
            message: message_for(status, &data),
            data,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::AuthExpired { status, .. } => Some(*status),
            ApiError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Http { data, .. } | ApiError::AuthExpired { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ApiError::Http {
                validation_errors, ..
            } => validation_errors.as_ref(),
            _ => None,
        }
    }

    /// Messages for one form field; empty when the field has none.
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.validation_errors()
            .and_then(|errors| errors.get(field))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}

fn message_for(status: StatusCode, data: &Value) -> String {
    data.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        })
}

fn validation_errors(data: &Value) -> Option<ValidationErrors> {
    let errors = data.get("errors")?.as_object()?;

    let map = errors
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect();

    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_prefers_body() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"message": "The given data was invalid."}),
        );
        assert_eq!(err.to_string(), "The given data was invalid.");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_message_falls_back_to_status_line() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, Value::Null);
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
        assert!(err.validation_errors().is_none());
    }

    #[test]
    fn test_validation_errors_extracted() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "message": "The given data was invalid.",
                "errors": {
                    "email": ["The email field is required.", "The email must be valid."],
                    "unit": "The unit is taken."
                }
            }),
        );

        assert_eq!(err.field_errors("email").len(), 2);
        assert_eq!(err.field_errors("unit"), ["The unit is taken.".to_string()]);
        assert!(err.field_errors("phone").is_empty());
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            ApiError::Timeout(30000).to_string(),
            "Request timeout after 30000ms"
        );
    }

    #[test]
    fn test_parse_message() {
        let err = ApiError::from(ParseError::NotFound);
        assert_eq!(
            err.to_string(),
            "Invalid JSON response from server: No valid JSON found in response"
        );
    }

    #[test]
    fn test_auth_expired() {
        let err = ApiError::auth_expired(StatusCode::UNAUTHORIZED, json!({"message": "Unauthenticated."}));
        assert!(err.is_auth_expired());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Unauthenticated.");
    }
}
