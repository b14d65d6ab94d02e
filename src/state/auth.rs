//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` mirrors the persisted session in memory and publishes every
//! change through a `watch` channel so views can re-render. It is reached via
//! an explicitly scoped `AuthProvider` rather than a global: code running
//! inside `AuthProvider::scope` calls `use_auth()`; anywhere else that call
//! panics.
//!
//! LIFECYCLE
//! =========
//! `loading` is true from construction until `mount` has read storage, then
//! false for the rest of the store's life. After that only `login` and
//! `logout` move between unauthenticated and authenticated.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use tokio::sync::watch;

use crate::net::api::ApiClient;
use crate::net::error::ClientError;
use crate::net::types::{LoginRequest, RegisterRequest, User};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

struct Inner {
    api: ApiClient,
    state: watch::Sender<AuthState>,
}

/// Shared handle to the session. Clones observe and mutate the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("state", &*self.inner.state.borrow()).finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Unmounted store: no user, `loading` set.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(AuthState { user: None, loading: true });
        Self { inner: Arc::new(Inner { api, state }) }
    }

    /// Read the persisted session. The stored user is adopted only when a
    /// token is stored alongside it. `loading` is cleared either way.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the stored user is not
    /// valid JSON; the store is then left unauthenticated.
    pub fn mount(&self) -> Result<(), ClientError> {
        let restored = self.restore();
        let user = restored.as_ref().ok().cloned().flatten();
        if let Some(user) = &user {
            tracing::debug!(user_id = %user.id, "restored persisted session");
        }
        self.inner.state.send_modify(|s| {
            s.user = user;
            s.loading = false;
        });
        restored.map(|_| ())
    }

    fn restore(&self) -> Result<Option<User>, ClientError> {
        let auth = self.inner.api.auth();
        let user = auth.get_user()?;
        let authenticated = auth.is_authenticated()?;
        Ok(user.filter(|_| authenticated))
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Log in and adopt the returned user.
    ///
    /// Concurrent logins are not coordinated; whichever response lands last
    /// determines the state.
    ///
    /// # Errors
    ///
    /// Propagates network, server and storage failures; state is unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let response = self.inner.api.auth().login(&LoginRequest { email, password }).await?;
        let user = response.user;
        tracing::info!(user_id = %user.id, "logged in");
        self.inner.state.send_modify(|s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Propagates network and server failures.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ClientError> {
        self.inner.api.auth().register(&RegisterRequest { name, email, password }).await?;
        tracing::info!(%email, "registered");
        Ok(())
    }

    /// Forget the session locally. The in-memory user is cleared even when
    /// the storage removal fails.
    ///
    /// # Errors
    ///
    /// Returns the storage failure, if any.
    pub fn logout(&self) -> Result<(), ClientError> {
        let cleared = self.inner.api.auth().logout();
        if let Err(e) = &cleared {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        self.inner.state.send_modify(|s| s.user = None);
        tracing::info!("logged out");
        cleared
    }
}

// =============================================================================
// PROVIDER SCOPE
// =============================================================================

tokio::task_local! {
    static AUTH_CONTEXT: SessionStore;
}

/// Owns the application's `SessionStore` and installs it for a scope.
#[derive(Clone, Debug)]
pub struct AuthProvider {
    store: SessionStore,
}

impl AuthProvider {
    /// Create and mount the store. A failed mount is logged and the provider
    /// starts unauthenticated.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let store = SessionStore::new(api);
        if let Err(e) = store.mount() {
            tracing::warn!(error = %e, "could not restore persisted session");
        }
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run `fut` with this provider's store reachable through [`use_auth`].
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        AUTH_CONTEXT.scope(self.store.clone(), fut).await
    }

    /// Synchronous counterpart of [`AuthProvider::scope`].
    pub fn sync_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        AUTH_CONTEXT.sync_scope(self.store.clone(), f)
    }
}

/// The store installed by the enclosing [`AuthProvider`] scope.
///
/// # Panics
///
/// Panics when called outside an `AuthProvider` scope.
#[must_use]
pub fn use_auth() -> SessionStore {
    try_use_auth().unwrap_or_else(|| panic!("use_auth must be used within an AuthProvider"))
}

/// Like [`use_auth`] but returns `None` outside a provider scope.
#[must_use]
pub fn try_use_auth() -> Option<SessionStore> {
    AUTH_CONTEXT.try_with(SessionStore::clone).ok()
}
