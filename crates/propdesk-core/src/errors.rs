//! Errors the edge server renders as `{"error": message}` JSON.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::role::UnknownRole;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    /// A role segment in the URL that is not one of the dashboards.
    pub fn unknown_role(raw: &str) -> Self {
        Self::not_found(UnknownRole(raw.to_string()))
    }

    /// Nothing is routed at `path`.
    pub fn no_page(path: &str) -> Self {
        Self::not_found(anyhow::anyhow!("No page at {path}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = %self.error, "Request failed");
        } else {
            tracing::debug!(status = %self.status.as_u16(), error = %self.error, "Request rejected");
        }

        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}
