//! Profile pages: who the session belongs to and what its tokens carry.

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Redirect, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use talent_core::auth::{TokenInfo, format_token_for_display};
use tracing::instrument;

use crate::{filters, middleware::RequireAuth, state::AppState};

use super::{Layout, render};

/// Characters of a raw token shown on the settings page.
const TOKEN_DISPLAY_LEN: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(|| async { Redirect::to("/profile/overview") }))
        .route("/profile/overview", get(overview))
        .route("/profile/settings", get(settings))
}

/// A claim name and its rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRow {
    pub name: String,
    pub value: String,
}

fn claim_rows(pairs: Vec<(String, String)>) -> Vec<ClaimRow> {
    pairs
        .into_iter()
        .map(|(name, value)| ClaimRow { name, value })
        .collect()
}

// =============================================================================
// Overview
// =============================================================================

#[derive(Template)]
#[template(path = "profile/overview.html")]
pub struct ProfileOverviewTemplate {
    pub layout: Layout,
    pub authenticated: bool,
    pub claims: Vec<ClaimRow>,
    pub roles: Vec<String>,
    pub permissions: Vec<&'static str>,
}

#[instrument(skip_all)]
pub async fn overview(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> Response {
    let user = &current.user;
    let registry = user.effective_registry();
    render(&ProfileOverviewTemplate {
        authenticated: user.is_authenticated(),
        claims: user
            .state
            .user_info()
            .map(|claims| claim_rows(claims.to_pairs()))
            .unwrap_or_default(),
        roles: registry.role_labels().map(str::to_string).collect(),
        permissions: registry.effective().iter().map(|p| p.as_str()).collect(),
        layout: Layout::new(&state, &current, "/profile/overview").await,
    })
}

// =============================================================================
// Settings (token inspector)
// =============================================================================

/// One decoded token, ready for display.
#[derive(Debug, Clone)]
pub struct TokenView {
    pub label: &'static str,
    pub display: String,
    pub status: String,
    pub valid: bool,
    pub issued_at: String,
    pub expires_at: String,
    pub header_json: String,
    pub claims: Vec<ClaimRow>,
    pub error: Option<String>,
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

impl TokenView {
    fn decode(label: &'static str, raw: &str, now: DateTime<Utc>) -> Self {
        let display = format_token_for_display(raw, TOKEN_DISPLAY_LEN);
        match TokenInfo::decode(raw, now) {
            Ok(info) => Self {
                label,
                display,
                status: info.expiration_status(),
                valid: info.is_valid,
                issued_at: format_time(info.issued_at),
                expires_at: format_time(info.expires_at),
                header_json: info.header_json(),
                claims: claim_rows(info.payload_pairs()),
                error: None,
            },
            // Opaque access tokens are common; show them without claims.
            Err(e) => Self {
                label,
                display,
                status: "Unknown".to_string(),
                valid: false,
                issued_at: "-".to_string(),
                expires_at: "-".to_string(),
                header_json: String::new(),
                claims: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Template)]
#[template(path = "profile/settings.html")]
pub struct ProfileSettingsTemplate {
    pub layout: Layout,
    pub tokens: Vec<TokenView>,
    pub scope: Option<String>,
    pub has_refresh_token: bool,
}

#[instrument(skip_all)]
pub async fn settings(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> Response {
    let now = Utc::now();
    let stored = current.user.tokens.as_ref();
    let mut tokens = Vec::new();
    if let Some(id_token) = stored.and_then(|t| t.id_token.as_deref()) {
        tokens.push(TokenView::decode("ID token", id_token, now));
    }
    if let Some(set) = stored {
        tokens.push(TokenView::decode("Access token", &set.access_token, now));
    }

    render(&ProfileSettingsTemplate {
        tokens,
        scope: stored.and_then(|t| t.scope.clone()),
        has_refresh_token: stored.is_some_and(|t| t.refresh_token.is_some()),
        layout: Layout::new(&state, &current, "/profile/settings").await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn jwt(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{payload}.c2ln")
    }

    fn fixed_now() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    #[test]
    fn test_token_view_decodes_claims() {
        let now = fixed_now();
        let token = jwt(&serde_json::json!({
            "sub": "u-1",
            "iat": now.timestamp() - 60,
            "exp": now.timestamp() + 2 * 3600 + 120,
        }));
        let view = TokenView::decode("ID token", &token, now);
        assert!(view.valid);
        assert!(view.error.is_none());
        assert_eq!(view.status, "Expires in 2h 2m");
        assert_eq!(view.issued_at, "2023-11-14 22:12:20 UTC");
        assert!(view.claims.iter().any(|c| c.name == "sub" && c.value == "u-1"));
    }

    #[test]
    fn test_token_view_status_boundaries() {
        let now = fixed_now();
        let status = |secs: i64| {
            let token = jwt(&serde_json::json!({"exp": now.timestamp() + secs}));
            TokenView::decode("Access token", &token, now).status
        };
        assert_eq!(status(24 * 3600), "Expires in 24h 0m");
        assert_eq!(status(60), "Expires in 1m");
        assert_eq!(status(59), "Expires soon");
        assert_eq!(status(-1), "Expired");
    }

    #[test]
    fn test_token_view_opaque_token() {
        let view = TokenView::decode("Access token", "opaque-access-token", Utc::now());
        assert!(!view.valid);
        assert!(view.error.is_some());
        assert_eq!(view.status, "Unknown");
    }
}
