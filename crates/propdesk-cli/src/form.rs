use serde::Deserialize;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Joins every field message into one line, falling back to
/// "<field> is invalid" for rules without a message.
pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

impl LoginForm {
    pub fn check(&self) -> anyhow::Result<()> {
        self.validate()
            .map_err(|errors| anyhow::anyhow!(format_errors(&errors)))
    }
}
