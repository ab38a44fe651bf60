//! The REST API client.

use std::sync::Arc;
use std::time::Duration;

use propdesk_config::{ApiConfig, ForbiddenPolicy};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::feedback::{Notice, ProgressTicker, UiFeedback};
use crate::parse::parse_lenient;
use crate::request::{RequestBody, RequestOptions, build_url};
use crate::tokens::TokenSource;

const JSON: &str = "application/json";

/// HTTP client for the PropDesk backend.
///
/// Cheap to clone; clones share the connection pool, token source and
/// feedback sink.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    tokens: Arc<dyn TokenSource>,
    feedback: Option<Arc<dyn UiFeedback>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client. Timeouts are enforced per call, not by the
    /// underlying connection pool.
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            config,
            tokens,
            feedback: None,
        })
    }

    /// Routes progress and notices to `feedback`.
    pub fn with_feedback(mut self, feedback: Arc<dyn UiFeedback>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Issues one call and resolves to the parsed body, with the `data`
    /// envelope removed unless `options.return_raw` is set.
    ///
    /// # Errors
    ///
    /// - `ApiError::Timeout` when the call outlives its timeout
    /// - `ApiError::Parse` when a 2xx body holds no readable JSON
    /// - `ApiError::AuthExpired` on 401 (after the token was dropped)
    /// - `ApiError::Http` for every other non-2xx response
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let timeout_ms = options
            .timeout
            .map(|t| t.as_millis() as u64)
            .unwrap_or(self.config.timeout_ms);
        let show_progress = options.show_progress.unwrap_or(self.config.show_progress);
        let show_notification = options.show_notification;
        let return_raw = options.return_raw;

        let ticker = match &self.feedback {
            Some(sink) if show_progress => Some(ProgressTicker::start(Arc::clone(sink))),
            _ => None,
        };

        let result = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.execute(endpoint, options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(endpoint, timeout_ms, "Request timed out");
                Err(ApiError::Timeout(timeout_ms))
            }
        };

        if let Some(ticker) = ticker {
            ticker.finish();
        }

        if show_notification {
            self.notify(&result);
        }

        result.map(|body| if return_raw { body } else { unwrap_envelope(body) })
    }

    /// Like [`request`](Self::request), but gives up as soon as `cancel`
    /// fires. The in-flight call is dropped, which aborts it.
    pub async fn request_with_cancel(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Value, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(endpoint, "Request cancelled by caller");
                Err(ApiError::Cancelled)
            }
            result = self.request(endpoint, options) => result,
        }
    }

    /// Issues a call and deserializes the (unwrapped) body into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = self.request(endpoint, options).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::with_method(Method::POST).json(body))
            .await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::with_method(Method::PUT).json(body))
            .await
    }

    pub async fn patch(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::with_method(Method::PATCH).json(body))
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::with_method(Method::DELETE))
            .await
    }

    async fn execute(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = build_url(&self.config.base_url, endpoint, &options.params)?;
        debug!(%url, "Sending request");

        let mut builder = self
            .http
            .request(options.method, url)
            .header(ACCEPT, JSON);

        if let Some(token) = self.tokens.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        builder = match options.body {
            Some(RequestBody::Multipart(form)) => builder.multipart(form.into_form()?),
            Some(RequestBody::Json(body)) => builder.header(CONTENT_TYPE, JSON).body(
                serde_json::to_vec(&body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?,
            ),
            None => builder.header(CONTENT_TYPE, JSON),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body = if status.is_success() {
            parse_lenient(&text)?
        } else {
            parse_lenient(&text).unwrap_or_else(|_| Value::String(text.trim().to_string()))
        };

        if self.is_unauthorized(status, &body) {
            warn!(status = %status.as_u16(), "Session rejected by backend, logging out");
            self.tokens.on_unauthorized();
            let status = if status.is_success() {
                StatusCode::UNAUTHORIZED
            } else {
                status
            };
            return Err(ApiError::auth_expired(status, body));
        }

        if !status.is_success() {
            let err = ApiError::from_response(status, body);
            debug!(status = %status.as_u16(), error = %err, "Request failed");
            return Err(err);
        }

        Ok(body)
    }

    fn is_unauthorized(&self, status: StatusCode, body: &Value) -> bool {
        status == StatusCode::UNAUTHORIZED
            || body.get("statusCode").and_then(Value::as_u64) == Some(401)
            || (status == StatusCode::FORBIDDEN
                && self.config.forbidden_policy == ForbiddenPolicy::Logout)
    }

    fn notify(&self, result: &Result<Value, ApiError>) {
        let Some(sink) = &self.feedback else { return };

        match result {
            Ok(body) => {
                if let Some(message) = body.get("message").and_then(Value::as_str) {
                    sink.notify(Notice::success(message));
                }
            }
            Err(err) => sink.notify(Notice::error(err.to_string())),
        }
    }
}

/// Removes one level of `{data: ...}` wrapping when present.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(unwrap_envelope(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(
            unwrap_envelope(json!({"data": [1, 2], "meta": {"total": 2}})),
            json!([1, 2])
        );
    }

    #[test]
    fn test_unwrap_is_idempotent_without_envelope() {
        assert_eq!(unwrap_envelope(json!({"id": 1})), json!({"id": 1}));
        assert_eq!(unwrap_envelope(json!([{"data": 1}])), json!([{"data": 1}]));
        assert_eq!(unwrap_envelope(Value::Null), Value::Null);
    }
}
