//! Authentication extractors and route guards.
//!
//! - [`CurrentSession`] loads the session's user once per request, running
//!   the silent refresh first
//! - [`RequireAuth`] admits authenticated users, or everyone when anonymous
//!   access is allowed
//! - [`RequireRole`] additionally requires one of a policy's roles and
//!   always requires authentication

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use talent_core::auth::{AuthGuard, GuardDecision, RoleGuard};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::SessionSynchronizer;
use crate::state::AppState;

/// The session and the user it belongs to.
#[derive(Clone)]
pub struct CurrentSession {
    pub session: Session,
    pub user: CurrentUser,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;

        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Self {
                session,
                user: user.clone(),
            });
        }

        let user = SessionSynchronizer::new(&session, state.auth_bus())
            .refreshed_user(state.oidc())
            .await?;
        if let Some(subject) = user.subject() {
            set_sentry_user(subject, user.state.user_info().and_then(|c| c.email.as_deref()));
        }
        parts.extensions.insert(user.clone());

        Ok(Self { session, user })
    }
}

/// Why a guard turned the request away.
#[derive(Debug)]
pub enum GuardRejection {
    /// Sign in first, then come back to `return_url`.
    RedirectToLogin { return_url: String },
    /// Signed in without a permitted role.
    Forbidden,
    /// The session could not be read.
    Error(AppError),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { return_url } => {
                Redirect::to(&login_redirect(&return_url)).into_response()
            }
            Self::Forbidden => Redirect::to("/403").into_response(),
            Self::Error(e) => e.into_response(),
        }
    }
}

impl From<AppError> for GuardRejection {
    fn from(error: AppError) -> Self {
        Self::Error(error)
    }
}

/// `/login?return_url=...` for the given local path.
#[must_use]
pub fn login_redirect(return_url: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("return_url", return_url)
        .finish();
    format!("/login?{query}")
}

fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| "/".to_string(), ToString::to_string)
}

fn reject(decision: GuardDecision, parts: &Parts) -> Result<(), GuardRejection> {
    match decision {
        GuardDecision::Admit => Ok(()),
        GuardDecision::RedirectToLogin => {
            tracing::debug!(path = %parts.uri.path(), "Not signed in, redirecting to login");
            Err(GuardRejection::RedirectToLogin {
                return_url: requested_path(parts),
            })
        }
        GuardDecision::Forbidden => {
            tracing::warn!(path = %parts.uri.path(), "Role not permitted");
            Err(GuardRejection::Forbidden)
        }
    }
}

/// Admits authenticated users, or anyone when anonymous access is allowed.
pub struct RequireAuth(pub CurrentSession);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state).await?;
        let guard = AuthGuard::new(state.config().allow_anonymous_access);
        reject(guard.check(current.user.is_authenticated()), parts)?;
        Ok(Self(current))
    }
}

/// The roles a [`RequireRole`] guard admits.
pub trait RolePolicy: Send + Sync + 'static {
    const GUARD: RoleGuard;

    /// Whether `user` would pass this guard, for showing or hiding actions.
    fn admits(user: &CurrentUser) -> bool {
        Self::GUARD.check(user.is_authenticated(), &user.state) == GuardDecision::Admit
    }
}

pub struct EmployeePolicy;
pub struct ManagerPolicy;
pub struct HrAdminPolicy;

impl RolePolicy for EmployeePolicy {
    const GUARD: RoleGuard = RoleGuard::EMPLOYEE;
}

impl RolePolicy for ManagerPolicy {
    const GUARD: RoleGuard = RoleGuard::MANAGER;
}

impl RolePolicy for HrAdminPolicy {
    const GUARD: RoleGuard = RoleGuard::HR_ADMIN;
}

/// Signed in with one of `P`'s roles. Signed-out users go to the login
/// page, others to `/403`.
pub struct RequireRole<P: RolePolicy>(pub CurrentSession, pub PhantomData<P>);

pub type RequireEmployee = RequireRole<EmployeePolicy>;
pub type RequireManager = RequireRole<ManagerPolicy>;
pub type RequireHrAdmin = RequireRole<HrAdminPolicy>;

impl<P: RolePolicy> FromRequestParts<AppState> for RequireRole<P> {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state).await?;
        let decision = P::GUARD.check(current.user.is_authenticated(), &current.user.state);
        reject(decision, parts)?;
        Ok(Self(current, PhantomData))
    }
}
