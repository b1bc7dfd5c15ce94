//! Talent Management Core - Shared types library.
//!
//! This crate provides the types used across Talent Management components:
//! - `admin` - The HR administration web application
//! - `integration-tests` - End-to-end tests against mocked services
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no sessions. This keeps it lightweight and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for entity IDs, emails, salaries and gender
//! - [`auth`] - Roles, permissions, token claims, session state and guards

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod types;

pub use types::*;
