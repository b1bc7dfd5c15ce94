//! Session layer configuration.
//!
//! In-memory store, `SameSite=Lax` so the identity provider's redirect back
//! to `/callback` carries the cookie, 8 hour inactivity expiry.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::TalentConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "talent_session";

/// Inactivity expiry in seconds.
const SESSION_EXPIRY_SECONDS: i64 = 8 * 60 * 60;

#[must_use]
pub fn create_session_layer(config: &TalentConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
