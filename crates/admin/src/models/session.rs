//! Authorization state kept in the browser session.

use serde::Serialize;
use talent_core::auth::{RoleRegistry, SessionState};

use crate::oidc::TokenSet;

/// Session keys. Only the session synchronizer writes the `auth.*` keys.
pub mod keys {
    /// Tokens from the identity provider.
    pub const TOKENS: &str = "auth.tokens";
    /// `is_authenticated` and `user_info`.
    pub const STATE: &str = "auth.state";
    /// Role registry recomputed on every authentication change.
    pub const PERMISSIONS: &str = "auth.permissions";
    /// State, nonce and code verifier between `/auth/login` and `/callback`.
    pub const PENDING_LOGIN: &str = "auth.pending_login";
    /// Queued notifications.
    pub const TOASTS: &str = "toasts";
}

/// Everything known about the requester, read once per request.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub state: SessionState,
    pub registry: RoleRegistry,
    pub tokens: Option<TokenSet>,
}

impl CurrentUser {
    /// Authenticated flag set, an access token present and not expired.
    #[must_use]
    pub fn is_authenticated_at(&self, now: i64) -> bool {
        self.state.is_authenticated()
            && self
                .tokens
                .as_ref()
                .is_some_and(|tokens| !tokens.is_expired_at(now))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(chrono::Utc::now().timestamp())
    }

    /// The stored registry while authenticated, otherwise the guest
    /// registry. An expired session grants nothing beyond reading.
    #[must_use]
    pub fn effective_registry(&self) -> RoleRegistry {
        if self.is_authenticated() {
            self.registry.clone()
        } else {
            RoleRegistry::guest()
        }
    }

    /// Access token to forward to the API.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.tokens.as_ref().map(|t| t.access_token.clone())
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.state.user_info().map(|claims| claims.sub.as_str())
    }
}

/// What templates need to know about the user.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub authenticated: bool,
    pub display_name: String,
    pub roles: Vec<String>,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        let authenticated = user.is_authenticated();
        Self {
            authenticated,
            display_name: if authenticated {
                user.state.display_name()
            } else {
                "Guest".to_string()
            },
            roles: user
                .effective_registry()
                .role_labels()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talent_core::auth::{AuthEvent, IdentityClaims, PermissionSet, RoleClaim};

    fn signed_in(roles: &[&str], expires_in: i64) -> CurrentUser {
        signed_in_at(roles, expires_in, chrono::Utc::now().timestamp())
    }

    fn signed_in_at(roles: &[&str], expires_in: i64, obtained_at: i64) -> CurrentUser {
        let mut state = SessionState::default();
        state.apply(AuthEvent::TokenReceived(IdentityClaims {
            sub: "u-1".into(),
            name: Some("Pat Doe".into()),
            role: Some(RoleClaim::Many(roles.iter().map(|r| (*r).to_string()).collect())),
            ..IdentityClaims::default()
        }));
        let registry = state.registry();
        CurrentUser {
            state,
            registry,
            tokens: Some(TokenSet {
                access_token: "at".into(),
                id_token: None,
                refresh_token: None,
                expires_in: Some(expires_in),
                scope: None,
                obtained_at,
            }),
        }
    }

    #[test]
    fn test_expired_token_is_not_authenticated() {
        let user = signed_in(&["Employee"], 3600);
        let now = chrono::Utc::now().timestamp();
        assert!(user.is_authenticated_at(now));
        assert!(!user.is_authenticated_at(now + 3600));
    }

    #[test]
    fn test_user_view_for_manager() {
        let view = UserView::from(&signed_in(&["Manager"], 3600));
        assert!(view.authenticated);
        assert_eq!(view.display_name, "Pat Doe");
        assert_eq!(view.roles, vec!["Manager".to_string()]);
    }

    #[test]
    fn test_expired_session_falls_back_to_guest() {
        let user = signed_in_at(&["HRAdmin"], 10, 0);
        assert!(!user.is_authenticated());

        let registry = user.effective_registry();
        assert!(registry.is_guest());
        assert_eq!(registry.effective(), PermissionSet::read_only());

        let view = UserView::from(&user);
        assert!(!view.authenticated);
        assert_eq!(view.display_name, "Guest");
        assert_eq!(view.roles, vec!["Guest".to_string()]);
    }

    #[test]
    fn test_user_view_for_guest() {
        let view = UserView::from(&CurrentUser::default());
        assert!(!view.authenticated);
        assert_eq!(view.display_name, "Guest");
        assert_eq!(view.roles, vec!["Guest".to_string()]);
    }
}
