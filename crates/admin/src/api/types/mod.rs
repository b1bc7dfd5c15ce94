//! Wire types for the REST API.

mod common;
mod dashboard;
mod department;
mod employee;
mod position;
mod salary_range;

pub use common::*;
pub use dashboard::*;
pub use department::*;
pub use employee::*;
pub use position::*;
pub use salary_range::*;
