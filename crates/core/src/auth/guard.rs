//! Route admission decisions.
//!
//! Guards are pure: they look at configuration and session state and return
//! a [`GuardDecision`]. Turning a decision into a redirect is the web layer's
//! job.

use super::role::Role;
use super::session::SessionState;

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Admit,
    /// Not signed in; send the user to the login page.
    RedirectToLogin,
    /// Signed in without a required role; send the user to the forbidden page.
    Forbidden,
}

/// Binary authentication guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthGuard {
    pub allow_anonymous_access: bool,
}

impl AuthGuard {
    #[must_use]
    pub const fn new(allow_anonymous_access: bool) -> Self {
        Self {
            allow_anonymous_access,
        }
    }

    /// Admit when anonymous access is allowed or the session is signed in.
    #[must_use]
    pub const fn check(&self, authenticated: bool) -> GuardDecision {
        if self.allow_anonymous_access || authenticated {
            GuardDecision::Admit
        } else {
            GuardDecision::RedirectToLogin
        }
    }
}

/// Guard requiring one of a fixed list of roles.
///
/// Role guards always require a signed-in session; the anonymous access flag
/// does not apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGuard {
    allowed: &'static [Role],
}

impl RoleGuard {
    /// Employee, Manager or HRAdmin.
    pub const EMPLOYEE: Self = Self::new(&[Role::Employee, Role::Manager, Role::HrAdmin]);
    /// Manager or HRAdmin.
    pub const MANAGER: Self = Self::new(&[Role::Manager, Role::HrAdmin]);
    /// HRAdmin only.
    pub const HR_ADMIN: Self = Self::new(&[Role::HrAdmin]);

    #[must_use]
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    #[must_use]
    pub const fn allowed(&self) -> &'static [Role] {
        self.allowed
    }

    /// Check `state` against the allowed roles. An empty list admits any
    /// signed-in user.
    #[must_use]
    pub fn check(&self, authenticated: bool, state: &SessionState) -> GuardDecision {
        if !authenticated {
            return GuardDecision::RedirectToLogin;
        }
        if self.allowed.is_empty() {
            return GuardDecision::Admit;
        }
        let names: Vec<&str> = self.allowed.iter().map(|r| r.as_str()).collect();
        if state.has_any_role(&names) {
            GuardDecision::Admit
        } else {
            GuardDecision::Forbidden
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::IdentityClaims;
    use crate::auth::role::RoleClaim;
    use crate::auth::session::AuthEvent;

    fn signed_in(role: &str) -> SessionState {
        let mut state = SessionState::default();
        state.apply(AuthEvent::TokenReceived(IdentityClaims {
            sub: "u".into(),
            role: Some(RoleClaim::One(role.into())),
            ..IdentityClaims::default()
        }));
        state
    }

    #[test]
    fn test_anonymous_access_admits_everyone() {
        let guard = AuthGuard::new(true);
        assert_eq!(guard.check(false), GuardDecision::Admit);
        assert_eq!(guard.check(true), GuardDecision::Admit);
    }

    #[test]
    fn test_redirects_when_anonymous_disallowed() {
        let guard = AuthGuard::new(false);
        assert_eq!(guard.check(false), GuardDecision::RedirectToLogin);
        assert_eq!(guard.check(true), GuardDecision::Admit);
    }

    #[test]
    fn test_role_guard_requires_sign_in() {
        let state = SessionState::default();
        assert_eq!(
            RoleGuard::EMPLOYEE.check(false, &state),
            GuardDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_manager_guard() {
        assert_eq!(
            RoleGuard::MANAGER.check(true, &signed_in("Manager")),
            GuardDecision::Admit
        );
        assert_eq!(
            RoleGuard::MANAGER.check(true, &signed_in("HRAdmin")),
            GuardDecision::Admit
        );
        assert_eq!(
            RoleGuard::MANAGER.check(true, &signed_in("Employee")),
            GuardDecision::Forbidden
        );
    }

    #[test]
    fn test_hr_admin_guard() {
        assert_eq!(
            RoleGuard::HR_ADMIN.check(true, &signed_in("Manager")),
            GuardDecision::Forbidden
        );
        assert_eq!(
            RoleGuard::HR_ADMIN.check(true, &signed_in("HRAdmin")),
            GuardDecision::Admit
        );
    }

    #[test]
    fn test_empty_role_list_admits_signed_in() {
        let guard = RoleGuard::new(&[]);
        assert_eq!(guard.check(true, &signed_in("Auditor")), GuardDecision::Admit);
    }
}
