//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TALENT_BASE_URL` - Public URL of this application (OIDC redirect URIs derive from it)
//! - `TALENT_API_URL` - Base URL of the HR REST API (e.g. `https://localhost:44378/api/v1`)
//! - `TALENT_OIDC_ISSUER` - Identity provider issuer URL
//! - `TALENT_OIDC_CLIENT_ID` - OAuth client ID registered with the identity provider
//!
//! ## Optional
//! - `TALENT_HOST` - Bind address (default: 127.0.0.1)
//! - `TALENT_PORT` - Listen port (default: 4200)
//! - `TALENT_PRODUCTION` - Production mode (default: false)
//! - `TALENT_ALLOW_ANONYMOUS_ACCESS` - Admit signed-out users to guarded pages
//!   (default: true outside production, false in production)
//! - `TALENT_API_TIMEOUT_SECS` - REST request timeout (default: 30)
//! - `TALENT_MENU_PATH` - Menu descriptor (default: crates/admin/static/data/menu.json)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (OIDC)
//! - `TALENT_OIDC_CLIENT_SECRET` - Client secret for confidential clients
//! - `TALENT_OIDC_SCOPE` - Requested scopes (default: `openid profile email`)
//! - `TALENT_OIDC_REQUIRE_HTTPS` - Require https endpoints (default: production)
//! - `TALENT_OIDC_SKIP_ISSUER_CHECK` - Skip discovery issuer match (default: !production)
//! - `TALENT_OIDC_STRICT_DISCOVERY` - Require endpoints under the issuer (default: false)
//! - `TALENT_OIDC_REFRESH_FACTOR` - Fraction of token lifetime before silent
//!   refresh (default: 0.75)
//!
//! ## Optional (TLS)
//! - `TALENT_TLS_CERT` - PEM-encoded certificate chain
//! - `TALENT_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SCOPE: &str = "openid profile email";
const DEFAULT_MENU_PATH: &str = "crates/admin/static/data/menu.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct TalentConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// Production mode
    pub production: bool,
    /// Admit signed-out users to authentication-guarded pages
    pub allow_anonymous_access: bool,
    /// HR REST API configuration
    pub api: ApiConfig,
    /// Identity provider configuration
    pub oidc: OidcConfig,
    /// Path of the JSON menu descriptor
    pub menu_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// HR REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// OpenID Connect client configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OidcConfig {
    pub issuer: Url,
    pub client_id: String,
    /// Only set for confidential clients; public clients rely on PKCE alone.
    pub client_secret: Option<SecretString>,
    pub scope: String,
    pub require_https: bool,
    pub skip_issuer_check: bool,
    pub strict_discovery: bool,
    /// Fraction of the access token lifetime after which it is refreshed.
    pub refresh_factor: f64,
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("issuer", &self.issuer.as_str())
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .field("require_https", &self.require_https)
            .field("skip_issuer_check", &self.skip_issuer_check)
            .field("strict_discovery", &self.strict_discovery)
            .field("refresh_factor", &self.refresh_factor)
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

/// Source of raw configuration values, keyed by variable name.
pub type Env<'a> = &'a dyn Fn(&str) -> Option<String>;

impl TlsConfig {
    fn from_vars(env: Env<'_>) -> Result<Option<Self>, ConfigError> {
        match (env("TALENT_TLS_CERT"), env("TALENT_TLS_KEY")) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "TALENT_TLS_*".to_string(),
                "Both TALENT_TLS_CERT and TALENT_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl OidcConfig {
    fn from_vars(env: Env<'_>, production: bool) -> Result<Self, ConfigError> {
        let issuer = parse_url(env, "TALENT_OIDC_ISSUER")?;
        let client_id = get_required_env(env, "TALENT_OIDC_CLIENT_ID")?;
        let client_secret = get_optional_env(env, "TALENT_OIDC_CLIENT_SECRET")
            .map(|secret| {
                validate_secret_strength(&secret, "TALENT_OIDC_CLIENT_SECRET")?;
                Ok::<_, ConfigError>(SecretString::from(secret))
            })
            .transpose()?;
        let require_https = parse_bool(env, "TALENT_OIDC_REQUIRE_HTTPS", production)?;

        if require_https && issuer.scheme() != "https" {
            return Err(ConfigError::InvalidEnvVar(
                "TALENT_OIDC_ISSUER".to_string(),
                "must use https when TALENT_OIDC_REQUIRE_HTTPS is enabled".to_string(),
            ));
        }

        let refresh_factor = get_env_or_default(env, "TALENT_OIDC_REFRESH_FACTOR", "0.75")
            .parse::<f64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TALENT_OIDC_REFRESH_FACTOR".to_string(), e.to_string())
            })?;
        if !(refresh_factor > 0.0 && refresh_factor <= 1.0) {
            return Err(ConfigError::InvalidEnvVar(
                "TALENT_OIDC_REFRESH_FACTOR".to_string(),
                "must be greater than 0 and at most 1".to_string(),
            ));
        }

        Ok(Self {
            issuer,
            client_id,
            client_secret,
            scope: get_env_or_default(env, "TALENT_OIDC_SCOPE", DEFAULT_SCOPE),
            require_https,
            skip_issuer_check: parse_bool(env, "TALENT_OIDC_SKIP_ISSUER_CHECK", !production)?,
            strict_discovery: parse_bool(env, "TALENT_OIDC_STRICT_DISCOVERY", false)?,
            refresh_factor,
        })
    }
}

impl TalentConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`TalentConfig::from_env`].
    pub fn from_vars(env: Env<'_>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(env, "TALENT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TALENT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(env, "TALENT_PORT", "4200")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TALENT_PORT".to_string(), e.to_string()))?;
        let base_url = parse_url(env, "TALENT_BASE_URL")?
            .as_str()
            .trim_end_matches('/')
            .to_string();
        let production = parse_bool(env, "TALENT_PRODUCTION", false)?;
        let allow_anonymous_access =
            parse_bool(env, "TALENT_ALLOW_ANONYMOUS_ACCESS", !production)?;

        let timeout_secs = get_env_or_default(env, "TALENT_API_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TALENT_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        let api = ApiConfig {
            base_url: parse_url(env, "TALENT_API_URL")?,
            timeout: Duration::from_secs(timeout_secs),
        };

        let oidc = OidcConfig::from_vars(env, production)?;
        let menu_path = PathBuf::from(get_env_or_default(
            env,
            "TALENT_MENU_PATH",
            DEFAULT_MENU_PATH,
        ));

        let sentry_dsn = get_optional_env(env, "SENTRY_DSN");
        let sentry_environment = get_optional_env(env, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(env, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(env, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_vars(env)?;

        Ok(Self {
            host,
            port,
            base_url,
            production,
            allow_anonymous_access,
            api,
            oidc,
            menu_path,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// OIDC redirect URI (`{base_url}/callback`).
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/callback", self.base_url)
    }

    /// Where the identity provider sends the browser after sign-out.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(env: Env<'_>, key: &str) -> Result<String, ConfigError> {
    env(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(env: Env<'_>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: Env<'_>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

fn parse_url(env: Env<'_>, key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(env, key)?;
    Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool(env: Env<'_>, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = get_optional_env(env, key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
