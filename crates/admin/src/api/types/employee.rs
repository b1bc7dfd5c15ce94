use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use talent_core::{DepartmentId, EmployeeId, Gender, PositionId, Salary, SalaryRangeId};

use super::common::wire_date;

/// An employee as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub employee_number: String,
    pub prefix: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "phoneNumber")]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default, alias = "dateOfBirth", with = "wire_date")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, with = "wire_date")]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Gender,
    pub salary: Salary,
    pub department_id: Option<DepartmentId>,
    pub position_id: Option<PositionId>,
    pub salary_range_id: Option<SalaryRangeId>,
}

impl Employee {
    /// Prefix, first, middle and last name joined by spaces; empty parts
    /// are skipped.
    #[must_use]
    pub fn full_name(&self) -> String {
        full_name(
            self.prefix.as_deref(),
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
        )
    }
}

/// Join name parts, skipping blanks.
#[must_use]
pub fn full_name(prefix: Option<&str>, first: &str, middle: Option<&str>, last: &str) -> String {
    [prefix, Some(first), middle, Some(last)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Body of `POST /Employees` and `PUT /Employees/{id}`, named the way the
/// employee form posts it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EmployeeId>,
    pub employee_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "dateOfBirth", with = "wire_date")]
    pub birthday: Option<NaiveDate>,
    #[serde(with = "wire_date")]
    pub hire_date: Option<NaiveDate>,
    pub gender: Gender,
    pub salary: Salary,
    pub department_id: DepartmentId,
    pub position_id: PositionId,
    pub salary_range_id: SalaryRangeId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "6f1c5a0e-3f4b-4f8e-9a55-0d2d1a8f1b11",
        "employeeNumber": "E-1001",
        "prefix": "Dr.",
        "firstName": "Ada",
        "middleName": null,
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "phoneNumber": "555-0100",
        "dateOfBirth": "1985-12-10T00:00:00",
        "gender": 1,
        "salary": 120000.5,
        "positionId": "0b9e3c3e-8d7d-4d4a-a8d2-3f4f5f6a7b8c"
    }"#;

    #[test]
    fn test_deserialize_with_aliases() {
        let employee: Employee = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(employee.phone.as_deref(), Some("555-0100"));
        assert_eq!(employee.birthday.unwrap().to_string(), "1985-12-10");
        assert_eq!(employee.gender, Gender::Female);
        assert!(employee.department_id.is_none());
        assert_eq!(employee.full_name(), "Dr. Ada Lovelace");
    }

    #[test]
    fn test_full_name_skips_blank_parts() {
        assert_eq!(full_name(Some(" "), "Grace", Some("B."), "Hopper"), "Grace B. Hopper");
        assert_eq!(full_name(None, "Alan", None, "Turing"), "Alan Turing");
    }
}
