//! What a failed REST call does to the page.
//!
//! | Status | Effect |
//! |---|---|
//! | 0 (transport) | logged as a warning, nothing shown |
//! | 403, 404, 500 | redirect to the matching error page |
//! | anything else | logged as an error and shown as a toast; 401 also warns |

use axum::response::Redirect;
use tower_sessions::Session;

use crate::api::ApiError;
use crate::services::toast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    LogOnly,
    ErrorPage(u16),
    Toast { message: String, unauthorized: bool },
}

impl Disposition {
    #[must_use]
    pub fn of(error: &ApiError) -> Self {
        match error.status() {
            Some(0) => Self::LogOnly,
            Some(status @ (403 | 404 | 500)) => Self::ErrorPage(status),
            status => Self::Toast {
                message: error.user_message(),
                unauthorized: status == Some(401),
            },
        }
    }
}

/// Log, toast or redirect for a failed call. Returns the redirect when the
/// caller must leave the page; otherwise the caller renders what it has.
pub async fn handle(session: &Session, error: &ApiError) -> Option<Redirect> {
    match Disposition::of(error) {
        Disposition::LogOnly => {
            tracing::warn!(error = %error, "API unreachable");
            None
        }
        Disposition::ErrorPage(status) => {
            tracing::warn!(status, error = %error, "API error, showing error page");
            Some(Redirect::to(&format!("/{status}")))
        }
        Disposition::Toast {
            message,
            unauthorized,
        } => {
            tracing::error!(error = %error, "API request failed");
            if unauthorized {
                tracing::warn!("Unauthorized access - authentication required");
            }
            toast::error(session, message).await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, message: Option<&str>) -> ApiError {
        ApiError::Status {
            status,
            reason: "Reason".into(),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_error_pages() {
        for code in [403, 404, 500] {
            assert_eq!(Disposition::of(&status(code, None)), Disposition::ErrorPage(code));
        }
    }

    #[test]
    fn test_unauthorized_toasts_without_redirect() {
        assert_eq!(
            Disposition::of(&status(401, Some("Token expired"))),
            Disposition::Toast {
                message: "Token expired".into(),
                unauthorized: true,
            }
        );
    }

    #[test]
    fn test_other_statuses_toast() {
        assert_eq!(
            Disposition::of(&status(422, None)),
            Disposition::Toast {
                message: "422 Reason".into(),
                unauthorized: false,
            }
        );
        assert_eq!(
            Disposition::of(&ApiError::Unsuccessful("Failed to load dashboard metrics".into())),
            Disposition::Toast {
                message: "Failed to load dashboard metrics".into(),
                unauthorized: false,
            }
        );
    }

    #[tokio::test]
    async fn test_handle_redirects_for_error_pages() {
        use std::sync::Arc;
        use tower_sessions::MemoryStore;

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(handle(&session, &status(404, None)).await.is_some());
        assert!(handle(&session, &status(400, Some("Bad"))).await.is_none());
        assert_eq!(toast::take(&session).await[0].message, "Bad");
    }
}
