//! # chat-client
//!
//! Client for the chat/auth backend: a REST wrapper that injects the bearer
//! token and normalizes failures, plus a scoped session store that mirrors
//! the server-issued session in memory and in persistent storage.
//!
//! `net` holds the HTTP surface, `state` the session store, `storage` the
//! key-value backends and `config` the environment-driven settings.

pub mod config;
pub mod net;
pub mod state;
pub mod storage;

pub use config::ClientConfig;
pub use net::api::ApiClient;
pub use net::error::{ApiError, ClientError};
pub use net::types::User;
pub use state::auth::{AuthProvider, AuthState, SessionStore, try_use_auth, use_auth};
