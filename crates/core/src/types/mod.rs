//! Core value types for Talent Management.
//!
//! This module provides type-safe wrappers for the HR domain's scalar values.

pub mod email;
pub mod gender;
pub mod id;
pub mod salary;

pub use email::{Email, EmailError};
pub use gender::Gender;
pub use id::*;
pub use salary::{Salary, SalaryBand, SalaryError};
