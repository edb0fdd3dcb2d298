// Application-wide session state
//
// One `SessionHandle` is built at startup and passed to whatever needs the
// current user. Every failed authentication path ends in `Unauthenticated`
// with the stored tokens cleared.

use std::sync::Arc;
use tokio::sync::watch;

use super::store::TokenStore;
use super::types::LoginRequest;
use crate::api;
use crate::error::{ApiError, Result};
use crate::http_client::ApiClient;
use crate::models::{MeUpdate, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Bootstrap has not run yet
    Uninitialized,
    Bootstrapping,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session (`{user, isLoading}`)
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<User>,
}

impl Session {
    pub fn uninitialized() -> Self {
        Self {
            status: SessionStatus::Uninitialized,
            user: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            user: None,
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Uninitialized | SessionStatus::Bootstrapping
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && self.user.is_some()
    }
}

struct SessionInner {
    api: Arc<ApiClient>,
    state: watch::Sender<Session>,
}

/// Shared handle to the session provider
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(Session::uninitialized());
        Self {
            inner: Arc::new(SessionInner { api, state }),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.inner.api
    }

    /// Current snapshot
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    /// Receiver notified on every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Restore the session from stored tokens; runs once at startup
    pub async fn bootstrap(&self) -> Session {
        if !self.tokens().has_tokens() {
            tracing::debug!("No stored tokens; starting unauthenticated");
            self.publish(Session::unauthenticated());
            return self.session();
        }

        self.publish(Session {
            status: SessionStatus::Bootstrapping,
            user: None,
        });

        match api::auth::me(self.api()).await {
            Ok(user) => {
                tracing::info!(username = %user.username, "Session restored");
                self.publish(Session::authenticated(user));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore session");
                self.reset();
            }
        }
        self.session()
    }

    /// Log in with username and password
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User> {
        let data = match api::auth::login(self.api(), credentials).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(username = %credentials.username, error = %e, "Login failed");
                self.reset();
                return Err(e);
            }
        };
        self.tokens().set(&data.tokens());

        // The embedded user is good enough if the profile call fails
        let user = match api::auth::me(self.api()).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch after login failed; using login payload");
                data.user
            }
        };

        tracing::info!(username = %user.username, role = %user.role, "Logged in");
        self.publish(Session::authenticated(user.clone()));
        Ok(user)
    }

    /// Log out. Local cleanup always happens, whatever the server says.
    pub async fn logout(&self) {
        let _cleanup = ResetOnDrop(self);

        if let Some(refresh) = self.tokens().refresh() {
            if let Err(e) = api::auth::logout(self.api(), &refresh).await {
                tracing::warn!(error = %e, "Logout request failed; clearing local session anyway");
            }
        }
        tracing::info!("Logged out");
    }

    /// Explicitly refresh the token pair (separate from the automatic 401 path)
    pub async fn refresh(&self) -> Result<()> {
        let Some(refresh) = self.tokens().refresh() else {
            self.reset();
            return Err(ApiError::Auth("No refresh token stored".to_string()));
        };

        let pair = match self.api().refresh_tokens(&refresh).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "Manual token refresh failed");
                self.reset();
                return Err(e);
            }
        };
        self.tokens().set(&pair);

        let has_user = self.inner.state.borrow().user.is_some();
        if has_user {
            match api::auth::me(self.api()).await {
                Ok(user) => self.publish(Session::authenticated(user)),
                Err(e) => {
                    tracing::warn!(error = %e, "Profile fetch after refresh failed");
                    self.reset();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Replace the current user without a round trip
    pub fn set_user(&self, user: Option<User>) {
        match user {
            Some(user) => self.publish(Session::authenticated(user)),
            None => self.publish(Session::unauthenticated()),
        }
    }

    /// Update the current user's profile and keep the session in sync
    pub async fn update_profile(&self, update: &MeUpdate) -> Result<User> {
        let user = api::auth::update_me(self.api(), update).await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    fn tokens(&self) -> &Arc<dyn TokenStore> {
        self.inner.api.tokens()
    }

    fn publish(&self, session: Session) {
        self.inner.state.send_replace(session);
    }

    /// Drop to the unauthenticated state and forget the tokens
    fn reset(&self) {
        self.tokens().clear();
        self.publish(Session::unauthenticated());
    }
}

/// Runs the logout cleanup even if the logout future is dropped mid-request
struct ResetOnDrop<'a>(&'a SessionHandle);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, RefreshCoordinator, TokenPair};
    use crate::models::{Language, UserRole};

    fn handle_with(tokens: Arc<dyn TokenStore>) -> SessionHandle {
        // Port 9 (discard) is never listening; any network call fails fast
        let api = ApiClient::new(
            "http://127.0.0.1:9/api/v1/",
            tokens,
            Arc::new(RefreshCoordinator::new()),
            2,
            2,
        )
        .unwrap();
        SessionHandle::new(Arc::new(api))
    }

    fn sample_user() -> User {
        User {
            id: 1,
            username: "admin".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            role: UserRole::CompanyAdmin,
            region: "unknown".into(),
            language: Language::Ru,
            company: Some(1),
            company_name: None,
            is_active: true,
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let handle = handle_with(Arc::new(MemoryTokenStore::new()));
        let session = handle.session();
        assert_eq!(session.status, SessionStatus::Uninitialized);
        assert!(session.is_loading());
        assert!(session.user.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_without_tokens() {
        let handle = handle_with(Arc::new(MemoryTokenStore::new()));
        let session = handle.bootstrap().await;
        assert_eq!(session, Session::unauthenticated());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_bootstrap_failure_clears_tokens() {
        let tokens: Arc<dyn TokenStore> =
            Arc::new(MemoryTokenStore::with_tokens(&TokenPair::new("a", "r")));
        let handle = handle_with(tokens.clone());

        let session = handle.bootstrap().await;
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert!(!tokens.has_tokens());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_unreachable() {
        let tokens: Arc<dyn TokenStore> =
            Arc::new(MemoryTokenStore::with_tokens(&TokenPair::new("a", "r")));
        let handle = handle_with(tokens.clone());
        handle.set_user(Some(sample_user()));

        handle.logout().await;

        assert_eq!(tokens.access(), None);
        assert_eq!(tokens.refresh(), None);
        assert_eq!(handle.session(), Session::unauthenticated());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        tokens.set(&TokenPair {
            access: "only-access".into(),
            refresh: None,
        });
        let handle = handle_with(tokens.clone());

        let err = handle.refresh().await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
        assert_eq!(tokens.access(), None);
        assert_eq!(handle.session().status, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_set_user_and_subscribe() {
        let handle = handle_with(Arc::new(MemoryTokenStore::new()));
        let mut updates = handle.subscribe();

        handle.set_user(Some(sample_user()));
        updates.changed().await.unwrap();
        assert!(updates.borrow().is_authenticated());
        assert_eq!(handle.user().map(|u| u.id), Some(1));

        handle.set_user(None);
        updates.changed().await.unwrap();
        assert_eq!(*updates.borrow(), Session::unauthenticated());
    }
}
