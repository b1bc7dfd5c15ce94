//! Authentication and authorization model.
//!
//! Pure state machines and lookup tables: no I/O, no clocks except where a
//! caller passes `now` in.

pub mod claims;
pub mod guard;
pub mod permission;
pub mod role;
pub mod session;

pub use claims::{
    IdentityClaims, TokenDecodeError, TokenInfo, decode_jwt_payload, format_token_for_display,
};
pub use guard::{AuthGuard, GuardDecision, RoleGuard};
pub use permission::{Permission, PermissionSet, RoleRegistry, permissions_for};
pub use role::{Role, RoleClaim};
pub use session::{AuthEvent, PermissionsChanged, SessionState, TokenErrorKind};
