//! OpenID Connect client for the identity provider.
//!
//! Implements the authorization code flow with PKCE for a server-side
//! client. Tokens never reach the browser; they live in the session.
//!
//! # Flow
//!
//! 1. [`OidcClient::begin_login`] builds the authorization URL and a
//!    [`PendingLogin`] (state, nonce, code verifier) to keep in the session
//! 2. The browser is redirected to the provider and comes back to `/callback`
//! 3. [`OidcClient::exchange_code`] trades the code and verifier for tokens
//! 4. [`OidcClient::identity_claims`] reads the user's claims from the ID
//!    token (nonce checked), falling back to the userinfo endpoint
//! 5. [`OidcClient::refresh`] renews tokens before they expire
//! 6. [`OidcClient::end_session_url`] signs the user out at the provider

pub mod discovery;
pub mod pkce;
pub mod token;

pub use discovery::ProviderMetadata;
pub use pkce::{PkcePair, generate_random_string};
pub use token::TokenSet;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use talent_core::auth::{IdentityClaims, TokenDecodeError, decode_jwt_payload};
use url::Url;

use crate::config::OidcConfig;
use token::{TokenErrorResponse, TokenResponse};

/// How long discovery documents are cached.
const DISCOVERY_TTL: Duration = Duration::from_secs(60 * 60);

/// Length of generated `state` and `nonce` values.
const STATE_LENGTH: usize = 32;

/// Errors talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Discovery failed: {0}")]
    Discovery(String),
    #[error("Invalid provider metadata: {0}")]
    InvalidMetadata(String),
    #[error("Token endpoint returned {error}: {}", .description.as_deref().unwrap_or("no description"))]
    TokenEndpoint {
        error: String,
        description: Option<String>,
    },
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(#[from] TokenDecodeError),
    #[error("ID token rejected: {0}")]
    IdTokenRejected(&'static str),
    #[error("Userinfo unavailable: {0}")]
    Userinfo(String),
}

/// Login state carried in the session between `/auth/login` and `/callback`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingLogin {
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
    /// Local path to return to after sign-in.
    pub return_url: String,
}

/// Client for the configured identity provider.
#[derive(Clone)]
pub struct OidcClient {
    inner: Arc<OidcClientInner>,
}

struct OidcClientInner {
    http: reqwest::Client,
    config: OidcConfig,
    discovery: Cache<String, Arc<ProviderMetadata>>,
}

impl OidcClient {
    /// Create a client. Discovery is deferred until first use.
    #[must_use]
    pub fn new(config: OidcConfig, http: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(OidcClientInner {
                http,
                config,
                discovery: Cache::builder()
                    .max_capacity(4)
                    .time_to_live(DISCOVERY_TTL)
                    .build(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &OidcConfig {
        &self.inner.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Provider metadata, fetched and validated once per TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be fetched or fails validation.
    pub async fn metadata(&self) -> Result<Arc<ProviderMetadata>, OidcError> {
        let issuer = self.inner.config.issuer.to_string();
        self.inner
            .discovery
            .try_get_with(issuer, self.fetch_metadata())
            .await
            .map_err(|e| OidcError::Discovery(e.to_string()))
    }

    async fn fetch_metadata(&self) -> Result<Arc<ProviderMetadata>, OidcError> {
        let url = discovery::discovery_url(&self.inner.config.issuer)?;
        tracing::debug!(%url, "Fetching OIDC discovery document");

        let response = self.inner.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(OidcError::Discovery(format!(
                "discovery endpoint returned {}",
                response.status()
            )));
        }

        let metadata: ProviderMetadata = response.json().await?;
        metadata.validate(&self.inner.config)?;
        tracing::info!(issuer = %metadata.issuer, "Loaded OIDC provider metadata");
        Ok(Arc::new(metadata))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization Code Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a login: returns the authorization URL to redirect to and the
    /// pending state to store in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails.
    pub async fn begin_login(
        &self,
        redirect_uri: &str,
        return_url: &str,
    ) -> Result<(String, PendingLogin), OidcError> {
        let metadata = self.metadata().await?;
        let pkce = PkcePair::generate();
        let pending = PendingLogin {
            state: generate_random_string(STATE_LENGTH),
            nonce: generate_random_string(STATE_LENGTH),
            code_verifier: pkce.verifier,
            return_url: return_url.to_string(),
        };

        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| OidcError::InvalidMetadata(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.inner.config.scope)
            .append_pair("state", &pending.state)
            .append_pair("nonce", &pending.nonce)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", PkcePair::method());

        Ok((url.into(), pending))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint rejects the request.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, OidcError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", code_verifier),
        ];
        self.token_request(&params).await
    }

    /// Refresh tokens. Refresh and ID tokens the provider omits are carried
    /// over from `current`.
    ///
    /// # Errors
    ///
    /// Returns an error if `current` has no refresh token or the provider
    /// rejects it.
    pub async fn refresh(&self, current: &TokenSet) -> Result<TokenSet, OidcError> {
        let Some(refresh_token) = current.refresh_token.as_deref() else {
            return Err(OidcError::TokenEndpoint {
                error: "invalid_request".to_string(),
                description: Some("no refresh token available".to_string()),
            });
        };
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("scope", self.inner.config.scope.as_str()),
        ];
        let fresh = self.token_request(&params).await?;
        Ok(fresh.merge_refreshed(current))
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenSet, OidcError> {
        let metadata = self.metadata().await?;
        let config = &self.inner.config;
        let mut params = params.to_vec();
        params.push(("client_id", config.client_id.as_str()));
        if let Some(secret) = &config.client_secret {
            params.push(("client_secret", secret.expose_secret()));
        }

        let response = self
            .inner
            .http
            .post(&metadata.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(body) => OidcError::TokenEndpoint {
                    error: body.error,
                    description: body.error_description,
                },
                Err(_) => OidcError::TokenEndpoint {
                    error: status.to_string(),
                    description: (!text.is_empty()).then_some(text),
                },
            });
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(TokenSet::from_response(
            token_response,
            chrono::Utc::now().timestamp(),
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Claims for the signed-in user.
    ///
    /// Read from the ID token when present (the `nonce` must match
    /// `expected_nonce` when one is given), otherwise from the userinfo
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID token is malformed or rejected, or if no ID
    /// token was issued and userinfo is unavailable.
    pub async fn identity_claims(
        &self,
        tokens: &TokenSet,
        expected_nonce: Option<&str>,
    ) -> Result<IdentityClaims, OidcError> {
        match tokens.id_token.as_deref() {
            Some(id_token) => {
                let metadata = self.metadata().await?;
                let claims: IdentityClaims = decode_jwt_payload(id_token)?;
                self.check_id_token(&claims, &metadata, expected_nonce)?;
                Ok(claims)
            }
            None => self.userinfo(&tokens.access_token).await,
        }
    }

    fn check_id_token(
        &self,
        claims: &IdentityClaims,
        metadata: &ProviderMetadata,
        expected_nonce: Option<&str>,
    ) -> Result<(), OidcError> {
        if let Some(expected) = expected_nonce
            && claims.nonce.as_deref() != Some(expected)
        {
            return Err(OidcError::IdTokenRejected("nonce mismatch"));
        }

        if !self.inner.config.skip_issuer_check
            && let Some(iss) = claims.iss.as_deref()
            && iss.trim_end_matches('/') != metadata.issuer.trim_end_matches('/')
        {
            return Err(OidcError::IdTokenRejected("issuer mismatch"));
        }

        let client_id = self.inner.config.client_id.as_str();
        let audience_ok = match claims.extra.get("aud") {
            None => true,
            Some(Value::String(aud)) => aud == client_id,
            Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(client_id)),
            Some(_) => false,
        };
        if !audience_ok {
            return Err(OidcError::IdTokenRejected("audience mismatch"));
        }

        Ok(())
    }

    /// Fetch claims from the userinfo endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider has no userinfo endpoint or the call fails.
    pub async fn userinfo(&self, access_token: &str) -> Result<IdentityClaims, OidcError> {
        let metadata = self.metadata().await?;
        let endpoint = metadata
            .userinfo_endpoint
            .as_deref()
            .ok_or_else(|| OidcError::Userinfo("provider has no userinfo endpoint".to_string()))?;

        let response = self
            .inner
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OidcError::Userinfo(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Provider sign-out URL, if the provider advertises an end-session endpoint.
    pub async fn end_session_url(
        &self,
        id_token_hint: Option<&str>,
        post_logout_redirect_uri: &str,
    ) -> Option<String> {
        let metadata = match self.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build end-session URL");
                return None;
            }
        };
        let mut url = Url::parse(metadata.end_session_endpoint.as_deref()?).ok()?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(hint) = id_token_hint {
                query.append_pair("id_token_hint", hint);
            }
            query
                .append_pair("post_logout_redirect_uri", post_logout_redirect_uri)
                .append_pair("client_id", &self.inner.config.client_id);
        }
        Some(url.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(issuer: &str) -> OidcConfig {
        OidcConfig {
            issuer: Url::parse(issuer).unwrap(),
            client_id: "TalentManagement".into(),
            client_secret: None,
            scope: "openid profile email".into(),
            require_https: false,
            skip_issuer_check: false,
            strict_discovery: false,
            refresh_factor: 0.75,
        }
    }

    fn jwt(claims: &Value) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap())
        )
    }

    async fn provider() -> MockServer {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": uri,
                "authorization_endpoint": format!("{uri}/connect/authorize"),
                "token_endpoint": format!("{uri}/connect/token"),
                "userinfo_endpoint": format!("{uri}/connect/userinfo"),
                "end_session_endpoint": format!("{uri}/connect/endsession"),
                "code_challenge_methods_supported": ["S256"]
            })))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_begin_login_builds_pkce_url() {
        let server = provider().await;
        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());

        let (url, pending) = client
            .begin_login("http://app/callback", "/employees")
            .await
            .unwrap();
        let url = Url::parse(&url).unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/connect/authorize");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "TalentManagement");
        assert_eq!(query["redirect_uri"], "http://app/callback");
        assert_eq!(query["state"], pending.state);
        assert_eq!(query["nonce"], pending.nonce);
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(
            query["code_challenge"],
            pkce::challenge_for(&pending.code_verifier)
        );
        assert_eq!(pending.return_url, "/employees");

        // second call is served from the discovery cache (mock expects 1 hit)
        client.begin_login("http://app/callback", "/").await.unwrap();
    }

    #[tokio::test]
    async fn test_exchange_code_sends_verifier() {
        let server = provider().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier=verifier-123"))
            .and(body_string_contains("client_id=TalentManagement"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access",
                "id_token": "id",
                "refresh_token": "refresh",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());
        let tokens = client
            .exchange_code("code-1", "verifier-123", "http://app/callback")
            .await
            .unwrap();
        assert_eq!(tokens.access_token, "access");
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_token_error_is_parsed() {
        let server = provider().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "code expired"
            })))
            .mount(&server)
            .await;

        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());
        let err = client
            .exchange_code("code-1", "v", "http://app/callback")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OidcError::TokenEndpoint { ref error, .. } if error == "invalid_grant"
        ));
    }

    #[tokio::test]
    async fn test_identity_claims_checks_nonce_and_audience() {
        let server = provider().await;
        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());
        let tokens = |claims: Value| TokenSet {
            access_token: "a".into(),
            id_token: Some(jwt(&claims)),
            refresh_token: None,
            expires_in: None,
            scope: None,
            obtained_at: 0,
        };

        let good = tokens(serde_json::json!({
            "sub": "u1",
            "nonce": "n1",
            "aud": "TalentManagement",
            "iss": server.uri(),
            "role": "HRAdmin"
        }));
        let claims = client.identity_claims(&good, Some("n1")).await.unwrap();
        assert_eq!(claims.roles(), vec!["HRAdmin"]);

        assert!(matches!(
            client.identity_claims(&good, Some("other")).await,
            Err(OidcError::IdTokenRejected("nonce mismatch"))
        ));

        let wrong_aud = tokens(serde_json::json!({"sub": "u1", "aud": ["someone-else"]}));
        assert!(matches!(
            client.identity_claims(&wrong_aud, None).await,
            Err(OidcError::IdTokenRejected("audience mismatch"))
        ));
    }

    #[tokio::test]
    async fn test_userinfo_fallback_without_id_token() {
        let server = provider().await;
        Mock::given(method("GET"))
            .and(path("/connect/userinfo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"sub": "u2", "email": "u2@example.com"})),
            )
            .mount(&server)
            .await;

        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());
        let tokens = TokenSet {
            access_token: "a".into(),
            id_token: None,
            refresh_token: None,
            expires_in: None,
            scope: None,
            obtained_at: 0,
        };
        let claims = client.identity_claims(&tokens, None).await.unwrap();
        assert_eq!(claims.display_name(), "u2@example.com");
    }

    #[tokio::test]
    async fn test_end_session_url() {
        let server = provider().await;
        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());
        let url = client
            .end_session_url(Some("id-token"), "http://app/")
            .await
            .unwrap();
        assert!(url.contains("/connect/endsession?"));
        assert!(url.contains("id_token_hint=id-token"));
        assert!(url.contains("post_logout_redirect_uri=http%3A%2F%2Fapp%2F"));
    }

    #[tokio::test]
    async fn test_discovery_failure_is_reported() {
        let server = MockServer::start().await;
        let client = OidcClient::new(config(&server.uri()), reqwest::Client::new());
        assert!(matches!(
            client.begin_login("http://app/callback", "/").await,
            Err(OidcError::Discovery(_))
        ));
    }
}
