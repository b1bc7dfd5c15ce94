//! Token set returned by the identity provider.

use serde::{Deserialize, Serialize};

/// Seconds before nominal expiry at which a token is treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Tokens obtained from the token endpoint, stored in the session.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

impl TokenSet {
    pub(super) fn from_response(response: TokenResponse, now: i64) -> Self {
        Self {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            scope: response.scope,
            obtained_at: now,
        }
    }

    /// Unix timestamp of nominal expiry, if the provider reported a lifetime.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_in.map(|secs| self.obtained_at + secs)
    }

    /// Expired, counting a 60 second leeway. Tokens without a lifetime never
    /// expire locally.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at()
            .is_some_and(|expires_at| now >= expires_at - EXPIRY_LEEWAY_SECS)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    /// Whether `factor` of the lifetime has elapsed and a refresh token is
    /// available to renew it.
    #[must_use]
    pub fn needs_refresh_at(&self, now: i64, factor: f64) -> bool {
        if self.refresh_token.is_none() {
            return false;
        }
        self.expires_in.is_some_and(|lifetime| {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let threshold = (lifetime as f64 * factor).floor() as i64;
            now - self.obtained_at >= threshold
        })
    }

    /// Combine a refresh response with the set it replaces: providers may
    /// omit the refresh token and ID token on refresh, in which case the old
    /// ones remain valid.
    #[must_use]
    pub fn merge_refreshed(mut self, previous: &Self) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token.clone_from(&previous.refresh_token);
        }
        if self.id_token.is_none() {
            self.id_token.clone_from(&previous.id_token);
        }
        self
    }
}

/// Raw token endpoint response.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

/// OAuth error body (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub(super) struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: Option<i64>, refresh: bool) -> TokenSet {
        TokenSet {
            access_token: "at".into(),
            id_token: Some("id".into()),
            refresh_token: refresh.then(|| "rt".to_string()),
            expires_in,
            scope: None,
            obtained_at: 1_000,
        }
    }

    #[test]
    fn test_expiry_uses_leeway() {
        let t = token(Some(3600), true);
        assert!(!t.is_expired_at(1_000 + 3600 - 61));
        assert!(t.is_expired_at(1_000 + 3600 - 60));
        assert!(t.is_expired_at(1_000 + 7200));
    }

    #[test]
    fn test_no_lifetime_never_expires() {
        assert!(!token(None, true).is_expired_at(i64::MAX / 2));
    }

    #[test]
    fn test_refresh_at_factor() {
        let t = token(Some(3600), true);
        assert!(!t.needs_refresh_at(1_000 + 2699, 0.75));
        assert!(t.needs_refresh_at(1_000 + 2700, 0.75));
    }

    #[test]
    fn test_no_refresh_without_refresh_token() {
        assert!(!token(Some(3600), false).needs_refresh_at(1_000 + 3599, 0.75));
    }

    #[test]
    fn test_merge_keeps_previous_tokens() {
        let previous = token(Some(3600), true);
        let mut fresh = token(Some(3600), false);
        fresh.id_token = None;
        fresh.access_token = "at2".into();

        let merged = fresh.merge_refreshed(&previous);
        assert_eq!(merged.access_token, "at2");
        assert_eq!(merged.refresh_token.as_deref(), Some("rt"));
        assert_eq!(merged.id_token.as_deref(), Some("id"));
    }

    #[test]
    fn test_debug_redacts() {
        let debug_output = format!("{:?}", token(Some(1), true));
        assert!(!debug_output.contains("\"at\""));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
