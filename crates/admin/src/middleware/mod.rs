//! HTTP middleware and extractors.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Security headers
//! 5. Session (in-memory store)
//!
//! Guards are extractors ([`auth::RequireAuth`], [`auth::RequireRole`])
//! rather than layers, so each route states its own requirement.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    CurrentSession, EmployeePolicy, GuardRejection, HrAdminPolicy, ManagerPolicy, RequireAuth,
    RequireEmployee, RequireHrAdmin, RequireManager, RequireRole, RolePolicy,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
