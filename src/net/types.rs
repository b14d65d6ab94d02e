//! Wire DTOs for the auth and chat endpoints.
//!
//! DESIGN
//! ======
//! Request bodies use the server's camelCase field names. Response bodies are
//! taken as the server sends them: fields the client does not read are kept in
//! `extra` (or the raw body) so nothing is lost when they are persisted.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An authenticated user as returned by `/api/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier. Numeric ids are kept in their decimal form.
    #[serde(deserialize_with = "deserialize_string_from_scalar")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Any other fields the server includes, persisted alongside the rest.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self { id: id.into(), username: username.into(), email: email.into(), extra: Map::new() }
    }
}

/// Body for `POST /api/auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body for `POST /api/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful `POST /api/auth/login` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Bearer token; only persisted when present and non-empty.
    #[serde(default)]
    pub token: Option<String>,
    pub user: User,
}

/// Body for `POST /api/chat/session`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest<'a> {
    pub user_id: &'a str,
}

/// Keys checked, in order, for the session handle.
const SESSION_ID_KEYS: [&str; 3] = ["sessionId", "session_id", "id"];

/// Server-assigned chat session handle, kept as the raw response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatSession {
    pub body: Value,
}

impl ChatSession {
    /// The session id: the first of `sessionId`, `session_id`, `id` present
    /// at the top level, then the same keys under a nested `session` object.
    /// Numbers are rendered in decimal.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        find_session_id(&self.body).or_else(|| self.body.get("session").and_then(find_session_id))
    }
}

fn find_session_id(value: &Value) -> Option<String> {
    SESSION_ID_KEYS.iter().find_map(|key| match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Body for `POST /api/chat/{sessionId}/message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub user_id: &'a str,
    pub message: &'a str,
}

/// Assistant reply to a chat message.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

fn deserialize_string_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("expected string or number")),
    }
}
