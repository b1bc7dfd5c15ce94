//! Static error pages.
//!
//! Rendered without the session so they work even when the session store
//! or the identity provider is the thing that failed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::filters;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "errors/error.html")]
pub struct ErrorPageTemplate {
    pub status: u16,
    pub title: &'static str,
    pub message: &'static str,
}

impl ErrorPageTemplate {
    #[must_use]
    pub fn for_status(status: StatusCode) -> Self {
        let (title, message) = match status.as_u16() {
            403 => (
                "Access denied",
                "You do not have permission to view this page.",
            ),
            404 => (
                "Page not found",
                "The page or record you are looking for does not exist.",
            ),
            _ => (
                "Something went wrong",
                "The server could not complete your request. Please try again later.",
            ),
        };
        Self {
            status: status.as_u16(),
            title,
            message,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/403", get(|| async { page(StatusCode::FORBIDDEN) }))
        .route("/404", get(|| async { page(StatusCode::NOT_FOUND) }))
        .route("/500", get(|| async { page(StatusCode::INTERNAL_SERVER_ERROR) }))
}

fn page(status: StatusCode) -> Response {
    (status, ErrorPageTemplate::for_status(status)).into_response()
}
