//! Authentication route handlers.
//!
//! Sign-in is the OpenID Connect authorization code flow with PKCE:
//! `/auth/login` stores state, nonce and verifier in the session and sends
//! the browser to the provider; `/callback` checks the state, exchanges the
//! code and hands the tokens to the session synchronizer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use talent_core::auth::TokenErrorKind;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::middleware::CurrentSession;
use crate::services::{AuthError, SessionSynchronizer};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/auth/login", get(start_login))
        .route("/callback", get(callback))
        .route("/logout", post(logout))
}

/// Keep only local paths, so the login flow cannot be used as an open
/// redirect.
#[must_use]
pub fn sanitize_return_url(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') => {
            url.to_string()
        }
        _ => "/dashboard".to_string(),
    }
}

fn login_error_message(code: &str) -> &'static str {
    match code {
        "access_denied" => "Sign-in was cancelled or denied by the identity provider.",
        "invalid_state" => "Your sign-in attempt expired. Please try again.",
        "provider_unavailable" => "The identity provider is unavailable. Please try again later.",
        "missing_code" | "token_exchange" => "Sign-in could not be completed. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

// =============================================================================
// Login page
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub return_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub login_href: String,
    pub error: Option<&'static str>,
}

/// GET /login
#[instrument(skip(current, params))]
async fn login_page(current: CurrentSession, Query(params): Query<LoginParams>) -> Response {
    let return_url = sanitize_return_url(params.return_url.as_deref());
    if current.user.is_authenticated() {
        return Redirect::to(&return_url).into_response();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("return_url", &return_url)
        .finish();
    LoginPageTemplate {
        login_href: format!("/auth/login?{query}"),
        error: params.error.as_deref().map(login_error_message),
    }
    .into_response()
}

// =============================================================================
// Authorization code flow
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StartLoginParams {
    pub return_url: Option<String>,
}

/// GET /auth/login
#[instrument(skip(session, state, params))]
async fn start_login(
    session: Session,
    State(state): State<AppState>,
    Query(params): Query<StartLoginParams>,
) -> Result<Response, AppError> {
    let sync = SessionSynchronizer::new(&session, state.auth_bus());
    let return_url = sanitize_return_url(params.return_url.as_deref());

    match state
        .oidc()
        .begin_login(&state.config().redirect_uri(), &return_url)
        .await
    {
        Ok((authorize_url, pending)) => {
            sync.begin_login(&pending).await?;
            tracing::debug!(%return_url, "Redirecting to identity provider");
            Ok(Redirect::to(&authorize_url).into_response())
        }
        Err(e) => {
            let error = AuthError::from(e);
            sync.token_error(TokenErrorKind::TokenError, error.to_string())
                .await?;
            Ok(Redirect::to(&format!("/login?error={}", error.code())).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /callback
#[instrument(skip_all)]
async fn callback(
    session: Session,
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let sync = SessionSynchronizer::new(&session, state.auth_bus());

    match complete_login(&sync, &session, &state, params).await {
        Ok(return_url) => Ok(Redirect::to(&return_url).into_response()),
        Err(AuthError::Session(e)) => Err(AuthError::Session(e).into()),
        Err(error) => {
            sync.token_error(TokenErrorKind::TokenError, error.to_string())
                .await?;
            Ok(Redirect::to(&format!("/login?error={}", error.code())).into_response())
        }
    }
}

async fn complete_login(
    sync: &SessionSynchronizer<'_>,
    session: &Session,
    state: &AppState,
    params: CallbackParams,
) -> Result<String, AuthError> {
    if let Some(error) = params.error {
        sync.take_pending_login(params.state.as_deref().unwrap_or_default())
            .await
            .ok();
        return Err(AuthError::Provider {
            error,
            description: params.error_description,
        });
    }

    let pending = sync
        .take_pending_login(params.state.as_deref().unwrap_or_default())
        .await?;
    let code = params.code.ok_or(AuthError::MissingCode)?;

    let tokens = state
        .oidc()
        .exchange_code(&code, &pending.code_verifier, &state.config().redirect_uri())
        .await?;
    let claims = state
        .oidc()
        .identity_claims(&tokens, Some(&pending.nonce))
        .await?;

    session.cycle_id().await?;
    tracing::info!(subject = %claims.sub, "User signed in");
    sync.token_received(&tokens, claims).await?;

    Ok(pending.return_url)
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
#[instrument(skip_all)]
async fn logout(session: Session, State(state): State<AppState>) -> Result<Redirect, AppError> {
    let sync = SessionSynchronizer::new(&session, state.auth_bus());
    let tokens = sync.logout().await?;
    clear_sentry_user();
    tracing::info!("User signed out");

    let post_logout = state.config().post_logout_redirect_uri();
    let target = match &tokens {
        Some(tokens) => {
            state
                .oidc()
                .end_session_url(tokens.id_token.as_deref(), &post_logout)
                .await
        }
        None => None,
    };
    Ok(Redirect::to(target.as_deref().unwrap_or("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_return_url() {
        assert_eq!(sanitize_return_url(Some("/employees?pageNumber=2")), "/employees?pageNumber=2");
        assert_eq!(sanitize_return_url(Some("//evil.example")), "/dashboard");
        assert_eq!(sanitize_return_url(Some("https://evil.example")), "/dashboard");
        assert_eq!(sanitize_return_url(Some("/\\evil.example")), "/dashboard");
        assert_eq!(sanitize_return_url(None), "/dashboard");
    }

    #[test]
    fn test_login_error_messages() {
        assert_eq!(
            login_error_message("invalid_state"),
            "Your sign-in attempt expired. Please try again."
        );
        assert_eq!(login_error_message("whatever"), "Sign-in failed. Please try again.");
    }
}
