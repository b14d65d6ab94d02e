//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use crate::net::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_STORE_PATH: &str = ".chat-session.json";

/// Path prefix every API endpoint is appended to.
pub const API_BASE_PATH: &str = "/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin without a trailing slash, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,
    /// Where `FileStorage` keeps the token and user.
    pub store_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_owned(), store_path: PathBuf::from(DEFAULT_STORE_PATH) }
    }
}

impl ClientConfig {
    /// Build a config for `base_url`, keeping the default store path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] for anything but an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self { base_url: normalize_base_url(base_url)?, ..Self::default() })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CHAT_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `CHAT_STORE_PATH`: default `.chat-session.json`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] when `CHAT_BASE_URL` is not http(s).
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("CHAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let store_path = std::env::var("CHAT_STORE_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);

        Ok(Self { base_url: normalize_base_url(&base_url)?, store_path })
    }

    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Full URL for an API endpoint such as `/auth/login`.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{API_BASE_PATH}{endpoint}", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}
