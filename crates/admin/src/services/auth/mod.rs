//! Session synchronizer: the single writer of a session's authorization
//! state.
//!
//! Three events drive it: token received, token error and logout. Each is
//! folded into the stored [`SessionState`]; when the fold reports a
//! permissions change, the recomputed [`RoleRegistry`] is stored next to it
//! and announced on the [`AuthEventBus`]. Everything else (guards,
//! templates, the API client) only reads what is written here.

mod bus;
mod error;

pub use bus::{AuthEventBus, AuthNotification};
pub use error::AuthError;

use talent_core::auth::{AuthEvent, IdentityClaims, RoleRegistry, SessionState, TokenErrorKind};
use tower_sessions::Session;
use tracing::instrument;

use crate::models::{CurrentUser, session_keys as keys};
use crate::oidc::{OidcClient, PendingLogin, TokenSet};

/// Applies authentication events to one browser session.
pub struct SessionSynchronizer<'a> {
    session: &'a Session,
    bus: &'a AuthEventBus,
}

impl<'a> SessionSynchronizer<'a> {
    #[must_use]
    pub const fn new(session: &'a Session, bus: &'a AuthEventBus) -> Self {
        Self { session, bus }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Stored state, or the signed-out default.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn state(&self) -> Result<SessionState, AuthError> {
        Ok(self.session.get(keys::STATE).await?.unwrap_or_default())
    }

    /// Stored registry, or the guest registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn registry(&self) -> Result<RoleRegistry, AuthError> {
        Ok(self.session.get(keys::PERMISSIONS).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn tokens(&self) -> Result<Option<TokenSet>, AuthError> {
        Ok(self.session.get(keys::TOKENS).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn current_user(&self) -> Result<CurrentUser, AuthError> {
        Ok(CurrentUser {
            state: self.state().await?,
            registry: self.registry().await?,
            tokens: self.tokens().await?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Login flow bookkeeping
    // ─────────────────────────────────────────────────────────────────────────

    /// Remember the login in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn begin_login(&self, pending: &PendingLogin) -> Result<(), AuthError> {
        self.session.insert(keys::PENDING_LOGIN, pending).await?;
        Ok(())
    }

    /// Take the login in progress if `state` matches it. The pending login
    /// is removed either way, so a state value works once.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoPendingLogin`] or [`AuthError::StateMismatch`].
    pub async fn take_pending_login(&self, state: &str) -> Result<PendingLogin, AuthError> {
        let pending: PendingLogin = self
            .session
            .remove(keys::PENDING_LOGIN)
            .await?
            .ok_or(AuthError::NoPendingLogin)?;
        if pending.state != state {
            return Err(AuthError::StateMismatch);
        }
        Ok(pending)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Adopt new tokens and the identity they carry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip_all, fields(subject = %claims.sub))]
    pub async fn token_received(
        &self,
        tokens: &TokenSet,
        claims: IdentityClaims,
    ) -> Result<(), AuthError> {
        self.session.insert(keys::TOKENS, tokens).await?;
        self.dispatch(AuthEvent::TokenReceived(claims)).await
    }

    /// Record a provider error. Logged and announced; the session keeps
    /// whatever state it had.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn token_error(
        &self,
        kind: TokenErrorKind,
        reason: impl Into<String>,
    ) -> Result<(), AuthError> {
        self.dispatch(AuthEvent::TokenError {
            kind,
            reason: reason.into(),
        })
        .await
    }

    /// Drop the tokens and sign the session out. Returns the dropped tokens
    /// so the caller can end the provider session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<Option<TokenSet>, AuthError> {
        let tokens = self.session.remove::<TokenSet>(keys::TOKENS).await?;
        self.session
            .remove::<PendingLogin>(keys::PENDING_LOGIN)
            .await?;
        self.dispatch(AuthEvent::LoggedOut).await?;
        Ok(tokens)
    }

    async fn dispatch(&self, event: AuthEvent) -> Result<(), AuthError> {
        if let AuthEvent::TokenError { kind, reason } = &event {
            tracing::warn!(kind = kind.as_str(), %reason, "Token error");
            self.bus.publish(AuthNotification::TokenError {
                kind: *kind,
                reason: reason.clone(),
            });
            return Ok(());
        }

        let mut state = self.state().await?;
        if let Some(changed) = state.apply(event) {
            self.session.insert(keys::STATE, &state).await?;
            self.session
                .insert(keys::PERMISSIONS, &changed.registry)
                .await?;
            self.bus.publish(changed.into());
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Silent refresh
    // ─────────────────────────────────────────────────────────────────────────

    /// Current user, refreshing the tokens first when they are due.
    ///
    /// A failed refresh is a token-refresh error: logged, announced, and the
    /// existing tokens stay in place until they expire.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    pub async fn refreshed_user(&self, oidc: &OidcClient) -> Result<CurrentUser, AuthError> {
        let user = self.current_user().await?;
        let now = chrono::Utc::now().timestamp();
        let due = user.state.is_authenticated()
            && user
                .tokens
                .as_ref()
                .is_some_and(|t| t.needs_refresh_at(now, oidc.config().refresh_factor));
        let Some(tokens) = user.tokens.as_ref().filter(|_| due) else {
            return Ok(user);
        };

        let refreshed = async {
            let fresh = oidc.refresh(tokens).await?;
            let claims = oidc.identity_claims(&fresh, None).await?;
            Ok::<_, crate::oidc::OidcError>((fresh, claims))
        }
        .await;

        match refreshed {
            Ok((fresh, claims)) => {
                tracing::debug!("Tokens refreshed");
                self.token_received(&fresh, claims).await?;
                self.current_user().await
            }
            Err(e) => {
                self.token_error(TokenErrorKind::TokenRefreshError, e.to_string())
                    .await?;
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use talent_core::auth::{Permission, RoleClaim};
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn tokens() -> TokenSet {
        TokenSet {
            access_token: "at".into(),
            id_token: Some("id".into()),
            refresh_token: None,
            expires_in: Some(3600),
            scope: None,
            obtained_at: chrono::Utc::now().timestamp(),
        }
    }

    fn claims(role: &str) -> IdentityClaims {
        IdentityClaims {
            sub: "u-42".into(),
            email: Some("pat@example.com".into()),
            role: Some(RoleClaim::One(role.into())),
            ..IdentityClaims::default()
        }
    }

    #[tokio::test]
    async fn test_token_received_signs_in_and_publishes_once() {
        let session = session();
        let bus = AuthEventBus::default();
        let mut rx = bus.subscribe();
        let sync = SessionSynchronizer::new(&session, &bus);

        sync.token_received(&tokens(), claims("HRAdmin")).await.unwrap();

        let user = sync.current_user().await.unwrap();
        assert!(user.is_authenticated());
        assert_eq!(user.subject(), Some("u-42"));
        assert!(user.registry.has_permission(Permission::CanDelete));
        assert_eq!(
            rx.try_recv().unwrap(),
            AuthNotification::PermissionsChanged {
                subject: Some("u-42".into()),
                roles: vec!["HRAdmin".into()],
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_token_error_changes_nothing() {
        let session = session();
        let bus = AuthEventBus::default();
        let sync = SessionSynchronizer::new(&session, &bus);
        sync.token_received(&tokens(), claims("Employee")).await.unwrap();
        let before = sync.current_user().await.unwrap();

        let mut rx = bus.subscribe();
        sync.token_error(TokenErrorKind::TokenRefreshError, "invalid_grant")
            .await
            .unwrap();

        let after = sync.current_user().await.unwrap();
        assert_eq!(before.state, after.state);
        assert_eq!(before.registry, after.registry);
        assert!(matches!(
            rx.try_recv().unwrap(),
            AuthNotification::TokenError {
                kind: TokenErrorKind::TokenRefreshError,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_state_and_returns_tokens() {
        let session = session();
        let bus = AuthEventBus::default();
        let sync = SessionSynchronizer::new(&session, &bus);
        sync.token_received(&tokens(), claims("Manager")).await.unwrap();

        let mut rx = bus.subscribe();
        let dropped = sync.logout().await.unwrap();
        assert_eq!(dropped.unwrap().id_token.as_deref(), Some("id"));

        let user = sync.current_user().await.unwrap();
        assert!(!user.state.is_authenticated());
        assert!(user.state.user_info().is_none());
        assert!(user.tokens.is_none());
        assert!(user.registry.is_guest());
        assert_eq!(
            rx.try_recv().unwrap(),
            AuthNotification::PermissionsChanged {
                subject: Some("u-42".into()),
                roles: vec!["Guest".into()],
            }
        );
    }

    #[tokio::test]
    async fn test_pending_login_is_single_use() {
        let session = session();
        let bus = AuthEventBus::default();
        let sync = SessionSynchronizer::new(&session, &bus);
        let pending = PendingLogin {
            state: "s1".into(),
            nonce: "n1".into(),
            code_verifier: "v1".into(),
            return_url: "/employees".into(),
        };
        sync.begin_login(&pending).await.unwrap();

        assert!(matches!(
            sync.take_pending_login("other").await,
            Err(AuthError::StateMismatch)
        ));
        assert!(matches!(
            sync.take_pending_login("s1").await,
            Err(AuthError::NoPendingLogin)
        ));

        sync.begin_login(&pending).await.unwrap();
        assert_eq!(sync.take_pending_login("s1").await.unwrap(), pending);
    }
}
