//! Unified error handling for the admin app.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::services::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session or sign-in failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// REST API call failed and the handler did not deal with it.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Auth(_) | Self::Internal(_))
            || matches!(&self, Self::Api(e) if e.status().is_none_or(|s| s >= 500))
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match &self {
            Self::Api(e) => match e.status() {
                Some(403) => Redirect::to("/403").into_response(),
                Some(404) => Redirect::to("/404").into_response(),
                Some(401) => Redirect::to("/login").into_response(),
                _ => Redirect::to("/500").into_response(),
            },
            Self::NotFound(_) => Redirect::to("/404").into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()).into_response(),
            // Don't expose internal details to clients
            Self::Auth(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Set the Sentry user context from the identity subject.
pub fn set_sentry_user(subject: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(subject.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
