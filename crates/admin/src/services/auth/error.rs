//! Sign-in and session errors.

use thiserror::Error;

use crate::oidc::OidcError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Session store read or write failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Identity provider interaction failed.
    #[error("identity provider error: {0}")]
    Oidc(#[from] OidcError),

    /// The callback arrived without a login in progress.
    #[error("no login in progress")]
    NoPendingLogin,

    /// The callback `state` does not match the one sent.
    #[error("state mismatch")]
    StateMismatch,

    /// The callback carried neither a code nor an error.
    #[error("authorization code missing")]
    MissingCode,

    /// The provider redirected back with an error.
    #[error("provider returned {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },
}

impl AuthError {
    /// Short code for the `?error=` parameter on the login page.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Oidc(OidcError::Http(_) | OidcError::Discovery(_)) => "provider_unavailable",
            Self::Oidc(_) => "token_exchange",
            Self::NoPendingLogin | Self::StateMismatch => "invalid_state",
            Self::MissingCode => "missing_code",
            Self::Provider { .. } => "access_denied",
        }
    }
}
