//! Per-call request options and bodies.

use std::time::Duration;

use reqwest::{Method, Url, multipart};
use serde_json::Value;

use crate::error::ApiError;

/// Request payload. JSON bodies set `Content-Type: application/json`;
/// multipart bodies let the transport pick the boundary header.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(FormData),
}

/// A multipart form that can be cloned and inspected before it is sent.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone)]
enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            bytes,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn into_form(self) -> Result<multipart::Form, ApiError> {
        self.parts
            .into_iter()
            .try_fold(multipart::Form::new(), |form, part| match part {
                FormPart::Text { name, value } => Ok(form.text(name, value)),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut part = multipart::Part::bytes(bytes).file_name(file_name);
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime).map_err(|e| {
                            ApiError::InvalidRequest(format!("invalid mime type {mime}: {e}"))
                        })?;
                    }
                    Ok(form.part(name, part))
                }
            })
    }
}

/// Options for one call. The defaults match a plain `GET` that shows
/// notifications, follows the configured progress setting, unwraps the
/// `data` envelope and uses the configured timeout.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<RequestBody>,
    pub params: Vec<(String, Value)>,
    pub show_notification: bool,
    /// `None` falls back to `ApiConfig::show_progress`.
    pub show_progress: Option<bool>,
    pub return_raw: bool,
    /// `None` falls back to `ApiConfig::timeout_ms`.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            params: Vec::new(),
            show_notification: true,
            show_progress: None,
            return_raw: false,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn multipart(mut self, form: FormData) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Adds a query parameter. `null` / `None` values are dropped when the
    /// URL is built.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn notification(mut self, show: bool) -> Self {
        self.show_notification = show;
        self
    }

    pub fn progress(mut self, show: bool) -> Self {
        self.show_progress = Some(show);
        self
    }

    /// Resolve to the parsed body without unwrapping `data`.
    pub fn raw(mut self) -> Self {
        self.return_raw = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Options for a background call: no toast, no progress bar, raw body.
    pub fn silent() -> Self {
        Self::get().notification(false).progress(false).raw()
    }
}

/// Joins `base` and `endpoint` verbatim and appends `params` as a query
/// string.
pub fn build_url(base: &str, endpoint: &str, params: &[(String, Value)]) -> Result<Url, ApiError> {
    let raw = format!("{base}{endpoint}");
    let mut url = Url::parse(&raw)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid URL {raw}: {e}")))?;

    let pairs: Vec<(&str, String)> = params
        .iter()
        .filter_map(|(key, value)| param_value(value).map(|v| (key.as_str(), v)))
        .collect();

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url)
}

fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| param_value(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
