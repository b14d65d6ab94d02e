//! Client error types.
//!
//! ERROR HANDLING
//! ==============
//! `ApiError` is the one normalized failure: a non-2xx HTTP response reduced
//! to its status and a human-readable message. Everything else (transport,
//! JSON, storage) is wrapped as-is in `ClientError` without normalization.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

use crate::storage::StorageError;

/// Message used when a failed response body is not JSON.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// A non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status: u16,
    /// Server-supplied `message`, or a fallback.
    pub message: String,
}

impl ApiError {
    /// Build an error from a failed response's status and raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        Self { status, message: error_message(status, body) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The HTTP round trip itself failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// HTTP status for server-side failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Resolve the message for a failed response body.
///
/// A JSON `message` is used when it carries something: strings as-is, lists
/// joined with `,`, other values in their JSON form. A missing, `null`,
/// `false`, `0` or empty `message` yields `HTTP <status>`. A body that is not
/// JSON yields [`FALLBACK_MESSAGE`].
pub(crate) fn error_message(status: u16, body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return FALLBACK_MESSAGE.to_owned();
    };
    value
        .get("message")
        .and_then(message_text)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn message_text(message: &Value) -> Option<String> {
    match message {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON) => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(items.iter().map(list_item).collect::<Vec<_>>().join(",")),
        other => Some(other.to_string()),
    }
}

fn list_item(item: &Value) -> String {
    match item {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
