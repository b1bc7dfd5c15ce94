//! Business logic services for the admin app.
//!
//! - `auth` - session synchronizer, auth event bus and silent refresh
//! - `api_failure` - dispositions for failed REST calls
//! - `toast` - one-shot notifications

pub mod api_failure;
pub mod auth;
pub mod toast;

pub use auth::{AuthError, AuthEventBus, AuthNotification, SessionSynchronizer};
