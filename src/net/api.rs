//! REST API client for the auth and chat endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every call goes through [`ApiClient::request`], which prefixes the endpoint
//! with `<base_url>/api`, always sends JSON, attaches the persisted bearer
//! token when one exists, and turns non-2xx responses into [`ApiError`].
//! `auth()` and `chat()` are thin namespaced wrappers on top of it.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses are the only failures normalized here. Transport and
//! decode failures propagate unchanged inside [`ClientError`]. Nothing is
//! retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, ClientError};
use super::types::{
    ChatReply, ChatSession, CreateSessionRequest, LoginRequest, LoginResponse, RegisterRequest, SendMessageRequest,
    User,
};
use crate::config::ClientConfig;
use crate::storage::{Storage, TOKEN_KEY, USER_KEY};

const JSON_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// REQUEST OPTIONS
// =============================================================================

/// Method, JSON body and extra headers for a single request.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Merged over `Content-Type`; the bearer header is applied after these.
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { method: Method::GET, body: None, headers: HeaderMap::new() }
    }
}

impl RequestOptions {
    /// `POST` with `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn post<B: Serialize + ?Sized>(body: &B) -> Result<Self, ClientError> {
        Ok(Self { method: Method::POST, body: Some(serde_json::to_value(body)?), ..Self::default() })
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Final header set: JSON content type, caller headers, then the bearer token.
fn build_headers(token: Option<&str>, extra: &HeaderMap) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    for name in extra.keys() {
        headers.remove(name);
    }
    for (name, value) in extra {
        headers.append(name.clone(), value.clone());
    }

    if let Some(token) = token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    }
    Ok(headers)
}

fn chat_message_endpoint(session_id: &str) -> String {
    format!("/chat/{session_id}/message")
}

// =============================================================================
// CLIENT
// =============================================================================

/// Shared HTTP client plus the storage that holds the session credentials.
///
/// Cloning is cheap; clones share the connection pool and storage.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.config.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http(config, storage, http))
    }

    /// Use a preconfigured `reqwest::Client` (proxies, custom TLS, timeouts).
    pub fn with_http(config: ClientConfig, storage: Arc<dyn Storage>, http: reqwest::Client) -> Self {
        Self { http, config: Arc::new(config), storage }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    #[must_use]
    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi { client: self }
    }

    /// The persisted bearer token, treating an empty string as absent.
    fn stored_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.storage.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// Send a request to `<base_url>/api<endpoint>` and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] for a non-2xx status, carrying the server's
    ///   `message` or a fallback.
    /// - [`ClientError::Http`] if the round trip fails.
    /// - [`ClientError::InvalidJson`] if a 2xx body does not decode as `T`.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<T, ClientError> {
        let url = self.config.endpoint_url(endpoint);
        let token = self.stored_token()?;
        let headers = build_headers(token.as_deref(), &options.headers)?;

        tracing::debug!(method = %options.method, %url, authorized = token.is_some(), "api request");

        let mut request = self.http.request(options.method, &url).headers(headers);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &String::from_utf8_lossy(&bytes));
            tracing::warn!(status = err.status, message = %err.message, endpoint, "api request failed");
            return Err(err.into());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Registration, login and the persisted session pair.
#[derive(Clone, Copy, Debug)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl AuthApi<'_> {
    /// `POST /api/auth/register`. Leaves storage untouched.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiClient::request`] failures.
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<Value, ClientError> {
        self.client.request("/auth/register", RequestOptions::post(body)?).await
    }

    /// `POST /api/auth/login`. When the response carries a token, the token
    /// and then the user are persisted before returning.
    ///
    /// The two writes are not atomic: a failure on the second leaves a token
    /// without a user until the next logout.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiClient::request`] failures and storage write failures.
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<LoginResponse, ClientError> {
        let response: LoginResponse = self.client.request("/auth/login", RequestOptions::post(body)?).await?;

        if let Some(token) = response.token.as_deref().filter(|t| !t.is_empty()) {
            let storage = &self.client.storage;
            storage.set_item(TOKEN_KEY, token)?;
            storage.set_item(USER_KEY, &serde_json::to_string(&response.user)?)?;
            tracing::debug!(user_id = %response.user.id, "persisted session");
        }

        Ok(response)
    }

    /// Erase the persisted token and user. No request is made.
    ///
    /// Both keys are attempted even if the first removal fails.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure.
    pub fn logout(&self) -> Result<(), ClientError> {
        let storage = &self.client.storage;
        let token = storage.remove_item(TOKEN_KEY);
        let user = storage.remove_item(USER_KEY);
        token?;
        user?;
        Ok(())
    }

    /// The persisted user, or `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidJson`] if the stored value is malformed.
    pub fn get_user(&self) -> Result<Option<User>, ClientError> {
        match self.client.storage.get_item(USER_KEY)? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Whether a bearer token is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.client.stored_token()?.is_some())
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn token(&self) -> Result<Option<String>, ClientError> {
        self.client.stored_token()
    }
}

// =============================================================================
// CHAT
// =============================================================================

/// Stateless chat calls; each request stands alone.
#[derive(Clone, Copy, Debug)]
pub struct ChatApi<'a> {
    client: &'a ApiClient,
}

impl ChatApi<'_> {
    /// `POST /api/chat/session`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiClient::request`] failures.
    pub async fn create_session(&self, user_id: &str) -> Result<ChatSession, ClientError> {
        let body = CreateSessionRequest { user_id };
        self.client.request("/chat/session", RequestOptions::post(&body)?).await
    }

    /// `POST /api/chat/{session_id}/message`, returning the assistant's reply.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiClient::request`] failures.
    pub async fn send_message(&self, session_id: &str, user_id: &str, message: &str) -> Result<String, ClientError> {
        let body = SendMessageRequest { user_id, message };
        let reply: ChatReply =
            self.client.request(&chat_message_endpoint(session_id), RequestOptions::post(&body)?).await?;
        Ok(reply.response)
    }
}
