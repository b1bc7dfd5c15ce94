//! Session-stored types.

pub mod session;

pub use session::{CurrentUser, UserView, keys as session_keys};
