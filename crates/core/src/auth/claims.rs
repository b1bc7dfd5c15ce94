//! Identity claims and JWT inspection.
//!
//! Tokens are decoded, never verified, here. Verification is the identity
//! provider client's concern; these helpers exist to read claims out of an ID
//! token received over the back channel and to show token details on the
//! profile page.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::RoleClaim;

/// Errors decoding a compact JWT.
#[derive(thiserror::Error, Debug)]
pub enum TokenDecodeError {
    #[error("token must have exactly three dot-separated parts")]
    Format,
    #[error("token segment is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token segment is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Claims about the signed-in user, as found in the ID token or returned by
/// the userinfo endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Every other claim, kept for the profile page.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IdentityClaims {
    /// Role names from the `role` claim. Absent claim yields an empty list.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.role.as_ref().map(RoleClaim::names).unwrap_or_default()
    }

    /// `name`, else `email`, else `"User"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.email.as_deref().filter(|e| !e.is_empty()))
            .unwrap_or("User")
            .to_string()
    }

    /// Claims as a flat, sorted `(name, rendered value)` list.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .map(|(k, v)| (k, render_claim(&v)))
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Decode the payload segment of a compact JWT into `T`.
///
/// # Errors
///
/// Returns [`TokenDecodeError`] if the token is not three segments or the
/// payload is not base64url-encoded JSON of the expected shape.
pub fn decode_jwt_payload<T: serde::de::DeserializeOwned>(
    token: &str,
) -> Result<T, TokenDecodeError> {
    let (_, payload, _) = split_token(token)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn split_token(token: &str) -> Result<(&str, &str, &str), TokenDecodeError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) => Ok((h, p, s)),
        _ => Err(TokenDecodeError::Format),
    }
}

fn decode_segment(segment: &str) -> Result<BTreeMap<String, Value>, TokenDecodeError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn render_claim(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_claim)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// A decoded JWT with timing information, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub raw: String,
    pub header: BTreeMap<String, Value>,
    pub payload: BTreeMap<String, Value>,
    pub signature: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds until expiry; negative once expired.
    pub expires_in: Option<i64>,
    pub is_expired: bool,
    pub is_valid: bool,
}

impl TokenInfo {
    /// Decode `token` relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] if the token is malformed.
    pub fn decode(token: &str, now: DateTime<Utc>) -> Result<Self, TokenDecodeError> {
        let (header, payload, signature) = split_token(token)?;
        let header = decode_segment(header)?;
        let payload = decode_segment(payload)?;

        let timestamp = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_i64)
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        };
        let issued_at = timestamp("iat");
        let expires_at = timestamp("exp");
        let is_expired = expires_at.is_some_and(|exp| exp < now);
        let expires_in = expires_at.map(|exp| (exp - now).num_seconds());

        Ok(Self {
            raw: token.to_string(),
            header,
            payload,
            signature: signature.to_string(),
            issued_at,
            expires_at,
            expires_in,
            is_expired,
            is_valid: !is_expired,
        })
    }

    /// Human-readable expiration status.
    #[must_use]
    pub fn expiration_status(&self) -> String {
        if self.expires_at.is_none() {
            return "Unknown".to_string();
        }
        if self.is_expired {
            return "Expired".to_string();
        }

        let expires_in = self.expires_in.unwrap_or(0).max(0);
        let hours = expires_in / 3600;
        let minutes = (expires_in % 3600) / 60;

        if hours > 24 {
            let days = hours / 24;
            let plural = if days > 1 { "s" } else { "" };
            format!("Expires in {days} day{plural}")
        } else if hours > 0 {
            format!("Expires in {hours}h {minutes}m")
        } else if minutes > 0 {
            format!("Expires in {minutes}m")
        } else {
            "Expires soon".to_string()
        }
    }

    /// Payload claims as `(name, rendered value)` pairs.
    #[must_use]
    pub fn payload_pairs(&self) -> Vec<(String, String)> {
        self.payload
            .iter()
            .map(|(k, v)| (k.clone(), render_claim(v)))
            .collect()
    }

    /// Header as pretty JSON.
    #[must_use]
    pub fn header_json(&self) -> String {
        serde_json::to_string_pretty(&self.header).unwrap_or_default()
    }
}

/// Shorten a token for display, keeping the first and last `max_len / 2`
/// characters.
#[must_use]
pub fn format_token_for_display(token: &str, max_len: usize) -> String {
    let len = token.chars().count();
    if len <= max_len {
        return token.to_string();
    }
    let half = max_len / 2;
    let start: String = token.chars().take(half).collect();
    let end: String = token.chars().skip(len - half).collect();
    format!("{start}...{end}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn encode(json: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(json).unwrap())
    }

    fn token(payload: &Value) -> String {
        let header = serde_json::json!({"alg": "RS256", "typ": "JWT"});
        format!("{}.{}.sig", encode(&header), encode(payload))
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    #[test]
    fn test_decode_identity_claims() {
        let jwt = token(&serde_json::json!({
            "sub": "u-1",
            "name": "Ada Lovelace",
            "role": ["HRAdmin", "Employee"],
            "tenant": "contoso"
        }));
        let claims: IdentityClaims = decode_jwt_payload(&jwt).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.roles(), vec!["HRAdmin", "Employee"]);
        assert_eq!(claims.extra.get("tenant"), Some(&Value::from("contoso")));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode_jwt_payload::<IdentityClaims>("a.b"),
            Err(TokenDecodeError::Format)
        ));
        assert!(decode_jwt_payload::<IdentityClaims>("a.!!!.c").is_err());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut claims = IdentityClaims {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            ..IdentityClaims::default()
        };
        assert_eq!(claims.display_name(), "Ada");
        claims.name = None;
        assert_eq!(claims.display_name(), "ada@example.com");
        claims.email = None;
        assert_eq!(claims.display_name(), "User");
    }

    #[test]
    fn test_roles_absent_is_empty() {
        assert!(IdentityClaims::default().roles().is_empty());
    }

    #[test]
    fn test_token_info_timing() {
        let exp = now() + Duration::hours(2) + Duration::minutes(5);
        let jwt = token(&serde_json::json!({"iat": now().timestamp(), "exp": exp.timestamp()}));
        let info = TokenInfo::decode(&jwt, now()).unwrap();
        assert_eq!(info.expires_in, Some(7500));
        assert!(!info.is_expired);
        assert!(info.is_valid);
        assert_eq!(info.expiration_status(), "Expires in 2h 5m");
        assert_eq!(info.header.get("alg"), Some(&Value::from("RS256")));
        assert_eq!(info.signature, "sig");
    }

    #[test]
    fn test_expiration_status_variants() {
        let status = |secs: i64| {
            let jwt = token(&serde_json::json!({"exp": now().timestamp() + secs}));
            TokenInfo::decode(&jwt, now()).unwrap().expiration_status()
        };
        assert_eq!(status(3 * 86_400), "Expires in 3 days");
        assert_eq!(status(25 * 3600), "Expires in 1 day");
        assert_eq!(status(24 * 3600), "Expires in 24h 0m");
        assert_eq!(status(600), "Expires in 10m");
        assert_eq!(status(30), "Expires soon");
        assert_eq!(status(-1), "Expired");

        let no_exp = token(&serde_json::json!({"sub": "x"}));
        assert_eq!(
            TokenInfo::decode(&no_exp, now()).unwrap().expiration_status(),
            "Unknown"
        );
    }

    #[test]
    fn test_format_token_for_display() {
        assert_eq!(format_token_for_display("short", 50), "short");
        let long = "a".repeat(30) + &"b".repeat(30);
        assert_eq!(
            format_token_for_display(&long, 10),
            "aaaaa...bbbbb"
        );
    }
}
