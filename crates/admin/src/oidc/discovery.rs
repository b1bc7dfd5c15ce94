//! OpenID Provider metadata (`/.well-known/openid-configuration`).

use serde::Deserialize;
use url::Url;

use super::OidcError;
use crate::config::OidcConfig;

/// The subset of provider metadata this client uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: Option<String>,
    pub end_session_endpoint: Option<String>,
    pub jwks_uri: Option<String>,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
}

/// Discovery document URL for an issuer.
///
/// # Errors
///
/// Returns an error if the joined URL is invalid.
pub fn discovery_url(issuer: &Url) -> Result<Url, OidcError> {
    let base = issuer.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/.well-known/openid-configuration"))
        .map_err(|e| OidcError::Discovery(e.to_string()))
}

impl ProviderMetadata {
    /// Check the metadata against client settings.
    ///
    /// - issuer must equal the configured issuer unless the issuer check is skipped
    /// - every endpoint must be https when https is required
    /// - with strict discovery, every endpoint must live under the issuer
    /// - if the provider lists PKCE methods, `S256` must be among them
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::InvalidMetadata`] describing the first violation.
    pub fn validate(&self, config: &OidcConfig) -> Result<(), OidcError> {
        let configured = config.issuer.as_str().trim_end_matches('/');
        if !config.skip_issuer_check && self.issuer.trim_end_matches('/') != configured {
            return Err(OidcError::InvalidMetadata(format!(
                "issuer mismatch: expected {configured}, got {}",
                self.issuer
            )));
        }

        for endpoint in self.endpoints() {
            let url = Url::parse(endpoint)
                .map_err(|e| OidcError::InvalidMetadata(format!("{endpoint}: {e}")))?;
            if config.require_https && url.scheme() != "https" {
                return Err(OidcError::InvalidMetadata(format!(
                    "endpoint is not https: {endpoint}"
                )));
            }
            if config.strict_discovery && !endpoint.starts_with(configured) {
                return Err(OidcError::InvalidMetadata(format!(
                    "endpoint outside issuer: {endpoint}"
                )));
            }
        }

        if !self.code_challenge_methods_supported.is_empty()
            && !self
                .code_challenge_methods_supported
                .iter()
                .any(|m| m == "S256")
        {
            return Err(OidcError::InvalidMetadata(
                "provider does not support S256 code challenges".to_string(),
            ));
        }

        Ok(())
    }

    fn endpoints(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.authorization_endpoint.as_str()),
            Some(self.token_endpoint.as_str()),
            self.userinfo_endpoint.as_deref(),
            self.end_session_endpoint.as_deref(),
            self.jwks_uri.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(issuer: &str) -> OidcConfig {
        OidcConfig {
            issuer: Url::parse(issuer).unwrap(),
            client_id: "TalentManagement".into(),
            client_secret: None,
            scope: "openid".into(),
            require_https: false,
            skip_issuer_check: false,
            strict_discovery: false,
            refresh_factor: 0.75,
        }
    }

    fn metadata(issuer: &str) -> ProviderMetadata {
        ProviderMetadata {
            issuer: issuer.into(),
            authorization_endpoint: format!("{issuer}/connect/authorize"),
            token_endpoint: format!("{issuer}/connect/token"),
            userinfo_endpoint: Some(format!("{issuer}/connect/userinfo")),
            end_session_endpoint: Some(format!("{issuer}/connect/endsession")),
            jwks_uri: None,
            code_challenge_methods_supported: vec!["plain".into(), "S256".into()],
        }
    }

    #[test]
    fn test_discovery_url() {
        let url = discovery_url(&Url::parse("https://sts.skoruba.local/").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sts.skoruba.local/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_valid_metadata() {
        let config = config("https://sts.local");
        assert!(metadata("https://sts.local").validate(&config).is_ok());
    }

    #[test]
    fn test_issuer_mismatch_unless_skipped() {
        let mut config = config("https://sts.local");
        let other = metadata("https://evil.local");
        assert!(other.validate(&config).is_err());
        config.skip_issuer_check = true;
        assert!(other.validate(&config).is_ok());
    }

    #[test]
    fn test_require_https() {
        let mut config = config("http://sts.local");
        config.require_https = true;
        assert!(metadata("http://sts.local").validate(&config).is_err());
    }

    #[test]
    fn test_strict_discovery() {
        let mut config = config("https://sts.local");
        config.strict_discovery = true;
        let mut meta = metadata("https://sts.local");
        meta.token_endpoint = "https://tokens.elsewhere/token".into();
        assert!(meta.validate(&config).is_err());
    }

    #[test]
    fn test_requires_s256_when_methods_listed() {
        let config = config("https://sts.local");
        let mut meta = metadata("https://sts.local");
        meta.code_challenge_methods_supported = vec!["plain".into()];
        assert!(meta.validate(&config).is_err());
        meta.code_challenge_methods_supported.clear();
        assert!(meta.validate(&config).is_ok());
    }
}
