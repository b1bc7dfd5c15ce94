//! Binds each entity to its REST endpoint.

use std::fmt::Display;

use serde::Serialize;
use serde::de::DeserializeOwned;
use talent_core::{DepartmentId, EmployeeId, PositionId, SalaryRangeId};

use super::types::{
    Department, DepartmentCommand, Employee, EmployeeCommand, Position, PositionCommand,
    SalaryRange, SalaryRangeCommand,
};

/// An entity served by a `/{ENDPOINT}` collection.
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Path segment, e.g. `Employees`.
    const ENDPOINT: &'static str;
    /// Singular noun for messages, e.g. `Employee`.
    const NOUN: &'static str;
    /// Default sort column for paged lists.
    const DEFAULT_ORDER: &'static str;
    /// Columns the list screen may sort by.
    const SORTABLE: &'static [&'static str];

    type Id: Display + Send + Sync;
    /// Create/update body.
    type Command: Serialize + Send + Sync;
}

impl Resource for Employee {
    const ENDPOINT: &'static str = "Employees";
    const NOUN: &'static str = "Employee";
    const DEFAULT_ORDER: &'static str = "lastName";
    const SORTABLE: &'static [&'static str] =
        &["lastName", "firstName", "employeeNumber", "email", "salary"];
    type Id = EmployeeId;
    type Command = EmployeeCommand;
}

impl Resource for Department {
    const ENDPOINT: &'static str = "Departments";
    const NOUN: &'static str = "Department";
    const DEFAULT_ORDER: &'static str = "name";
    const SORTABLE: &'static [&'static str] = &["name"];
    type Id = DepartmentId;
    type Command = DepartmentCommand;
}

impl Resource for Position {
    const ENDPOINT: &'static str = "Positions";
    const NOUN: &'static str = "Position";
    const DEFAULT_ORDER: &'static str = "positionTitle";
    const SORTABLE: &'static [&'static str] = &["positionTitle", "positionNumber"];
    type Id = PositionId;
    type Command = PositionCommand;
}

impl Resource for SalaryRange {
    const ENDPOINT: &'static str = "SalaryRanges";
    const NOUN: &'static str = "Salary range";
    const DEFAULT_ORDER: &'static str = "name";
    const SORTABLE: &'static [&'static str] = &["name", "minSalary", "maxSalary"];
    type Id = SalaryRangeId;
    type Command = SalaryRangeCommand;
}

/// The requested sort column if sortable, else the default.
#[must_use]
pub fn order_by<R: Resource>(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|column| R::SORTABLE.iter().find(|c| **c == column).copied())
        .unwrap_or(R::DEFAULT_ORDER)
}
