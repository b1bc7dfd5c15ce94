//! Per-session authorization state and the events that drive it.
//!
//! [`SessionState`] is only ever changed through [`SessionState::apply`].
//! Whoever owns the state (the session synchronizer in the admin crate) feeds
//! it [`AuthEvent`]s and forwards any [`PermissionsChanged`] signal it gets
//! back to subscribers.

use serde::{Deserialize, Serialize};

use super::claims::IdentityClaims;
use super::permission::RoleRegistry;
use super::role::Role;

/// Which identity provider error was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorKind {
    /// Obtaining a token failed (discovery, code exchange, state mismatch...).
    TokenError,
    /// A silent refresh failed.
    TokenRefreshError,
}

impl TokenErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenError => "token_error",
            Self::TokenRefreshError => "token_refresh_error",
        }
    }
}

/// Events that move a session between authenticated and anonymous.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A token was obtained or refreshed. Carries the claims to adopt.
    TokenReceived(IdentityClaims),
    /// The identity provider reported an error. Logged by the owner only.
    TokenError {
        kind: TokenErrorKind,
        reason: String,
    },
    /// The user asked to sign out.
    LoggedOut,
}

/// Emitted whenever the role registry must be recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsChanged {
    pub subject: Option<String>,
    pub registry: RoleRegistry,
}

/// UI-visible authorization state of one browser session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    is_authenticated: bool,
    user_info: Option<IdentityClaims>,
}

impl SessionState {
    /// Fold one event into the state.
    ///
    /// Token-received and logout both return a permissions-changed signal;
    /// token errors leave the state untouched and return `None`.
    pub fn apply(&mut self, event: AuthEvent) -> Option<PermissionsChanged> {
        match event {
            AuthEvent::TokenReceived(claims) => {
                self.is_authenticated = true;
                self.user_info = Some(claims);
                Some(self.permissions_changed())
            }
            AuthEvent::TokenError { .. } => None,
            AuthEvent::LoggedOut => {
                let subject = self.user_info.take().map(|c| c.sub);
                self.is_authenticated = false;
                Some(PermissionsChanged {
                    subject,
                    registry: RoleRegistry::guest(),
                })
            }
        }
    }

    fn permissions_changed(&self) -> PermissionsChanged {
        PermissionsChanged {
            subject: self.user_info.as_ref().map(|c| c.sub.clone()),
            registry: self.registry(),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub const fn user_info(&self) -> Option<&IdentityClaims> {
        self.user_info.as_ref()
    }

    /// Role names from the current claims; empty when signed out.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        if !self.is_authenticated {
            return Vec::new();
        }
        self.user_info
            .as_ref()
            .map(IdentityClaims::roles)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }

    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        let held = self.roles();
        roles.iter().any(|wanted| held.iter().any(|r| r == wanted.as_ref()))
    }

    #[must_use]
    pub fn is_employee(&self) -> bool {
        self.has_role(Role::Employee.as_str())
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.has_role(Role::Manager.as_str())
    }

    #[must_use]
    pub fn is_hr_admin(&self) -> bool {
        self.has_role(Role::HrAdmin.as_str())
    }

    /// Display name for the header; `"User"` when nothing better is known.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.user_info
            .as_ref()
            .map_or_else(|| "User".to_string(), IdentityClaims::display_name)
    }

    /// The role registry derived from the current claims.
    #[must_use]
    pub fn registry(&self) -> RoleRegistry {
        RoleRegistry::from_claims(self.is_authenticated, &self.roles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permission::PermissionSet;
    use crate::auth::role::RoleClaim;

    fn claims(roles: &[&str]) -> IdentityClaims {
        IdentityClaims {
            sub: "u-42".into(),
            name: Some("Grace Hopper".into()),
            role: Some(RoleClaim::Many(roles.iter().map(ToString::to_string).collect())),
            ..IdentityClaims::default()
        }
    }

    #[test]
    fn test_token_received_authenticates_and_signals() {
        let mut state = SessionState::default();
        let signal = state.apply(AuthEvent::TokenReceived(claims(&["HRAdmin"])));

        assert!(state.is_authenticated());
        assert!(state.is_hr_admin());
        let signal = signal.expect("permissions change");
        assert_eq!(signal.subject.as_deref(), Some("u-42"));
        assert_eq!(signal.registry.effective(), PermissionSet::all());
    }

    #[test]
    fn test_token_error_changes_nothing() {
        let mut state = SessionState::default();
        state.apply(AuthEvent::TokenReceived(claims(&["Employee"])));
        let before = state.clone();

        let signal = state.apply(AuthEvent::TokenError {
            kind: TokenErrorKind::TokenRefreshError,
            reason: "invalid_grant".into(),
        });

        assert!(signal.is_none());
        assert_eq!(state, before);
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_logout_clears_state_and_signals_guest() {
        let mut state = SessionState::default();
        state.apply(AuthEvent::TokenReceived(claims(&["Manager"])));

        let signal = state.apply(AuthEvent::LoggedOut).expect("permissions change");

        assert!(!state.is_authenticated());
        assert!(state.user_info().is_none());
        assert!(state.roles().is_empty());
        assert!(signal.registry.is_guest());
        assert_eq!(signal.subject.as_deref(), Some("u-42"));
    }

    #[test]
    fn test_role_helpers() {
        let mut state = SessionState::default();
        assert!(!state.has_any_role(&["Employee"]));
        state.apply(AuthEvent::TokenReceived(claims(&["Manager", "Employee"])));
        assert!(state.is_manager());
        assert!(state.is_employee());
        assert!(!state.is_hr_admin());
        assert!(state.has_any_role(&["HRAdmin", "Manager"]));
        assert!(!state.has_any_role(&["HRAdmin"]));
    }

    #[test]
    fn test_display_name() {
        let mut state = SessionState::default();
        assert_eq!(state.display_name(), "User");
        state.apply(AuthEvent::TokenReceived(claims(&[])));
        assert_eq!(state.display_name(), "Grace Hopper");
    }

    #[test]
    fn test_unauthenticated_registry_is_guest() {
        assert!(SessionState::default().registry().is_guest());
    }
}
