//! HTTP route handlers for the admin app.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Redirect to /dashboard
//!
//! # Auth (OpenID Connect, authorization code + PKCE)
//! GET  /login                    - Login page
//! GET  /auth/login               - Redirect to the identity provider
//! GET  /callback                 - Provider redirect target
//! POST /logout                   - Sign out (provider end-session when offered)
//!
//! # Dashboard
//! GET  /dashboard                - Metrics overview
//!
//! # Employees (read: signed in, write: Manager or HRAdmin)
//! GET  /employees                - Paged list
//! GET  /employees/{id}           - Detail
//! GET  /employees/create         - Create form
//! POST /employees/create         - Create
//! GET  /employees/edit/{id}      - Edit form
//! POST /employees/edit/{id}      - Update
//! POST /employees/{id}/delete    - Delete
//!
//! # Departments (same shape, Manager or HRAdmin to write)
//! # Positions, Salary ranges (same shape, HRAdmin to write)
//! POST /positions/add-mock       - Generate mock positions
//!
//! # Profile
//! GET  /profile, /profile/overview, /profile/settings
//!
//! # Error pages
//! GET  /403, /404, /500
//!
//! Anything else redirects to /dashboard.
//! ```

pub mod auth;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod errors;
pub mod positions;
pub mod profile;
pub mod salary_ranges;

use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::{ApiError, Resource, UserApi};
use crate::error::AppError;
use crate::menu::MenuEntry;
use crate::middleware::CurrentSession;
use crate::models::UserView;
use crate::services::{api_failure, toast};
use crate::services::toast::Toast;
use crate::state::AppState;

/// Build the application routes (everything except `/health` and `/static`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .merge(auth::router())
        .route("/dashboard", get(dashboard::dashboard))
        .merge(employees::router())
        .merge(departments::router())
        .merge(positions::router())
        .merge(salary_ranges::router())
        .merge(profile::router())
        .merge(errors::router())
        .fallback(|| async { Redirect::to("/dashboard") })
}

// =============================================================================
// Layout
// =============================================================================

/// Sidebar entry with its active state resolved.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub name: String,
    pub icon: String,
    pub href: String,
    pub external: bool,
    pub new_tab: bool,
    pub active: bool,
    pub children: Vec<NavItem>,
}

impl NavItem {
    fn from_entry(entry: &MenuEntry, path: &str) -> Self {
        let children: Vec<Self> = entry
            .children
            .iter()
            .map(|child| Self::from_entry(child, path))
            .collect();
        Self {
            name: entry.name.clone(),
            icon: entry.icon.clone(),
            href: entry.href.clone(),
            external: entry.external,
            new_tab: entry.new_tab,
            active: entry.is_active(path) || children.iter().any(|c| c.active),
            children,
        }
    }
}

/// What `base.html` needs: the user, the filtered menu and pending toasts.
#[derive(Debug, Clone)]
pub struct Layout {
    pub user: UserView,
    pub nav: Vec<NavItem>,
    pub current_path: String,
    pub toasts: Vec<Toast>,
}

impl Layout {
    /// Build the layout for `path`. Takes the session's queued toasts, so
    /// call it after every API call of the request has been made.
    pub async fn new(state: &AppState, current: &CurrentSession, path: &str) -> Self {
        let registry = current.user.effective_registry();
        Self {
            user: UserView::from(&current.user),
            nav: state
                .menu()
                .visible_for(&registry)
                .iter()
                .map(|entry| NavItem::from_entry(entry, path))
                .collect(),
            current_path: path.to_string(),
            toasts: toast::take(&current.session).await,
        }
    }
}

/// Render a template, logging failures.
pub fn render(template: &impl Template) -> Response {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
    .into_response()
}

// =============================================================================
// CRUD helpers
// =============================================================================

/// Parse a path id; a malformed one is a missing record.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("record {raw}")))
}

/// Load every `R` for a select box. A failure goes through the API failure
/// handling, adds `Error loading {label}` and yields an empty list unless
/// the page must be left.
pub(crate) async fn lookup<R: Resource>(
    api: &UserApi,
    session: &Session,
    label: &str,
) -> Result<Vec<R>, Redirect> {
    match api.get_all::<R>(&[]).await {
        Ok(items) => Ok(items),
        Err(e) => {
            if let Some(redirect) = api_failure::handle(session, &e).await {
                return Err(redirect);
            }
            toast::error(session, format!("Error loading {label}")).await;
            Ok(Vec::new())
        }
    }
}

/// Resolve an optional foreign key for a detail page. Failures are logged
/// and shown as a missing value.
pub(crate) async fn related<R: Resource>(api: &UserApi, id: Option<&R::Id>) -> Option<R> {
    let id = id?;
    match api.get_by_id::<R>(id).await {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(endpoint = R::ENDPOINT, error = %e, "Related record unavailable");
            None
        }
    }
}

/// Report a failed create/update: API failure handling first, then the
/// screen's own message. Returns the redirect if the page must be left.
pub(crate) async fn save_failed(
    session: &Session,
    error: &ApiError,
    message: &str,
) -> Option<Redirect> {
    let redirect = api_failure::handle(session, error).await;
    if redirect.is_none() {
        toast::error(session, message).await;
    }
    redirect
}

/// Posted by delete buttons.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    /// Display name for the confirmation toast.
    pub name: String,
    /// `list` when posted from the list screen.
    pub from: String,
}

/// Toast texts of a delete.
pub(crate) struct DeleteMessages {
    pub success: String,
    pub failure: String,
}

/// Delete `id` and go back to `list_path`.
pub(crate) async fn delete_record<R: Resource>(
    api: &UserApi,
    session: &Session,
    id: &R::Id,
    messages: DeleteMessages,
    list_path: &str,
) -> Response {
    match api.delete::<R>(id).await {
        Ok(()) => {
            tracing::info!(endpoint = R::ENDPOINT, %id, "Record deleted");
            toast::success(session, messages.success).await;
        }
        Err(e) => {
            if let Some(redirect) = api_failure::handle(session, &e).await {
                return redirect.into_response();
            }
            toast::error(session, messages.failure).await;
        }
    }
    Redirect::to(list_path).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use talent_core::EmployeeId;

    #[test]
    fn test_parse_id() {
        assert!(parse_id::<EmployeeId>("3fa85f64-5717-4562-b3fc-2c963f66afa6").is_ok());
        assert!(matches!(
            parse_id::<EmployeeId>("create"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_nav_item_active_from_child() {
        let entry = MenuEntry {
            name: "Admin".into(),
            icon: "settings".into(),
            href: "/admin".into(),
            external: false,
            new_tab: false,
            children: vec![MenuEntry {
                name: "Positions".into(),
                icon: String::new(),
                href: "/positions".into(),
                external: false,
                new_tab: false,
                children: vec![],
            }],
        };
        let item = NavItem::from_entry(&entry, "/positions/edit/1");
        assert!(item.active);
        assert!(item.children[0].active);
    }
}
