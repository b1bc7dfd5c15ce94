//! HTML form input and validation.
//!
//! Each form keeps the raw strings it was posted with, so a failed
//! validation re-renders exactly what the user typed, and converts into an
//! API command only when every rule passes.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;
use talent_core::{
    DepartmentId, Email, EmployeeId, Gender, PositionId, Salary, SalaryBand, SalaryError,
    SalaryRangeId,
};

use crate::api::{
    Department, DepartmentCommand, Employee, EmployeeCommand, Position, PositionCommand,
    SalaryRange, SalaryRangeCommand, wire_date,
};

/// Field name to message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Self> {
        if self.is_empty() {
            value().ok_or(self)
        } else {
            Err(self)
        }
    }
}

// =============================================================================
// Field rules
// =============================================================================

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn check_length(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) {
    if value.chars().count() > max {
        errors.add(field, format!("{label} cannot exceed {max} characters"));
    }
}

fn required(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) -> Option<String> {
    let Some(value) = trimmed(value) else {
        errors.add(field, format!("{label} is required"));
        return None;
    };
    check_length(errors, field, label, &value, max);
    Some(value)
}

fn optional(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) -> Option<String> {
    let value = trimmed(value)?;
    check_length(errors, field, label, &value, max);
    Some(value)
}

fn required_id<T: FromStr>(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    value: &str,
) -> Option<T> {
    let Some(value) = trimmed(value) else {
        errors.add(field, format!("{label} is required"));
        return None;
    };
    let parsed = value.parse().ok();
    if parsed.is_none() {
        errors.add(field, format!("{label} is invalid"));
    }
    parsed
}

fn required_date(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    value: &str,
) -> Option<NaiveDate> {
    let Some(value) = trimmed(value) else {
        errors.add(field, format!("{label} is required"));
        return None;
    };
    let parsed = wire_date::parse(&value);
    if parsed.is_none() {
        errors.add(field, format!("{label} must be a valid date"));
    }
    parsed
}

fn required_salary(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    value: &str,
) -> Option<Salary> {
    let Some(value) = trimmed(value) else {
        errors.add(field, format!("{label} is required"));
        return None;
    };
    match Salary::parse(&value) {
        Ok(salary) => Some(salary),
        Err(SalaryError::Negative) => {
            errors.add(field, format!("{label} cannot be negative"));
            None
        }
        Err(_) => {
            errors.add(field, format!("{label} must be a number"));
            None
        }
    }
}

fn opt_string(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn opt_id<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

// =============================================================================
// Employee
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeForm {
    pub employee_number: String,
    pub prefix: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub hire_date: String,
    pub salary: String,
    pub department_id: String,
    pub position_id: String,
    pub salary_range_id: String,
}

impl EmployeeForm {
    /// An empty form with the defaults of a new employee.
    #[must_use]
    pub fn new_employee() -> Self {
        Self {
            gender: Gender::default().code().to_string(),
            salary: "0".to_string(),
            ..Self::default()
        }
    }

    /// Validate into a create (`id: None`) or update command.
    ///
    /// # Errors
    ///
    /// Returns every failed rule keyed by field name.
    pub fn validate(&self, id: Option<EmployeeId>) -> Result<EmployeeCommand, FormErrors> {
        let mut errors = FormErrors::default();

        let employee_number = required(
            &mut errors,
            "employeeNumber",
            "Employee number",
            &self.employee_number,
            50,
        );
        let prefix = optional(&mut errors, "prefix", "Prefix", &self.prefix, 10);
        let first_name = required(&mut errors, "firstName", "First name", &self.first_name, 100);
        let middle_name = optional(
            &mut errors,
            "middleName",
            "Middle name",
            &self.middle_name,
            100,
        );
        let last_name = required(&mut errors, "lastName", "Last name", &self.last_name, 100);
        let suffix = optional(&mut errors, "suffix", "Suffix", &self.suffix, 10);
        let birthday = required_date(
            &mut errors,
            "dateOfBirth",
            "Date of birth",
            &self.date_of_birth,
        );
        let gender = required_id::<Gender>(&mut errors, "gender", "Gender", &self.gender);
        let email = match trimmed(&self.email) {
            None => {
                errors.add("email", "Email is required");
                None
            }
            Some(raw) => match Email::parse(&raw) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.add("email", e.to_string());
                    None
                }
            },
        };
        let phone = required(&mut errors, "phoneNumber", "Phone number", &self.phone_number, 20);
        let address = optional(&mut errors, "address", "Address", &self.address, 500);
        let hire_date = required_date(&mut errors, "hireDate", "Hire date", &self.hire_date);
        let salary = required_salary(&mut errors, "salary", "Salary", &self.salary);
        let department_id = required_id::<DepartmentId>(
            &mut errors,
            "departmentId",
            "Department",
            &self.department_id,
        );
        let position_id = required_id::<PositionId>(
            &mut errors,
            "positionId",
            "Position",
            &self.position_id,
        );
        let salary_range_id = required_id::<SalaryRangeId>(
            &mut errors,
            "salaryRangeId",
            "Salary range",
            &self.salary_range_id,
        );

        errors.into_result(|| {
            Some(EmployeeCommand {
                id,
                employee_number: employee_number?,
                prefix,
                first_name: first_name?,
                middle_name,
                last_name: last_name?,
                suffix,
                email: email?.into_inner(),
                phone: phone?,
                address,
                birthday: Some(birthday?),
                hire_date: Some(hire_date?),
                gender: gender?,
                salary: salary?,
                department_id: department_id?,
                position_id: position_id?,
                salary_range_id: salary_range_id?,
            })
        })
    }
}

impl From<&Employee> for EmployeeForm {
    fn from(employee: &Employee) -> Self {
        let date = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
        };
        Self {
            employee_number: employee.employee_number.clone(),
            prefix: opt_string(employee.prefix.as_ref()),
            first_name: employee.first_name.clone(),
            middle_name: opt_string(employee.middle_name.as_ref()),
            last_name: employee.last_name.clone(),
            suffix: opt_string(employee.suffix.as_ref()),
            date_of_birth: date(employee.birthday),
            gender: employee.gender.code().to_string(),
            email: employee.email.clone(),
            phone_number: opt_string(employee.phone.as_ref()),
            address: opt_string(employee.address.as_ref()),
            hire_date: date(employee.hire_date),
            salary: employee.salary.amount().to_string(),
            department_id: opt_id(employee.department_id.as_ref()),
            position_id: opt_id(employee.position_id.as_ref()),
            salary_range_id: opt_id(employee.salary_range_id.as_ref()),
        }
    }
}

// =============================================================================
// Department
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DepartmentForm {
    pub name: String,
}

impl DepartmentForm {
    /// # Errors
    ///
    /// Returns every failed rule keyed by field name.
    pub fn validate(&self, id: Option<DepartmentId>) -> Result<DepartmentCommand, FormErrors> {
        let mut errors = FormErrors::default();
        let name = required(&mut errors, "name", "Name", &self.name, 100);
        errors.into_result(|| Some(DepartmentCommand { id, name: name? }))
    }
}

impl From<&Department> for DepartmentForm {
    fn from(department: &Department) -> Self {
        Self {
            name: department.name.clone(),
        }
    }
}

// =============================================================================
// Position
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PositionForm {
    pub position_title: String,
    pub position_number: String,
    pub position_description: String,
    pub department_id: String,
    pub salary_range_id: String,
}

impl PositionForm {
    /// # Errors
    ///
    /// Returns every failed rule keyed by field name.
    pub fn validate(&self, id: Option<PositionId>) -> Result<PositionCommand, FormErrors> {
        let mut errors = FormErrors::default();
        let position_title = required(
            &mut errors,
            "positionTitle",
            "Position title",
            &self.position_title,
            100,
        );
        let position_number = required(
            &mut errors,
            "positionNumber",
            "Position number",
            &self.position_number,
            50,
        );
        let position_description = optional(
            &mut errors,
            "positionDescription",
            "Description",
            &self.position_description,
            500,
        );
        let department_id = required_id::<DepartmentId>(
            &mut errors,
            "departmentId",
            "Department",
            &self.department_id,
        );
        let salary_range_id = required_id::<SalaryRangeId>(
            &mut errors,
            "salaryRangeId",
            "Salary range",
            &self.salary_range_id,
        );

        errors.into_result(|| {
            Some(PositionCommand {
                id,
                position_title: position_title?,
                position_number: position_number?,
                position_description,
                department_id: department_id?,
                salary_range_id: salary_range_id?,
            })
        })
    }
}

impl From<&Position> for PositionForm {
    fn from(position: &Position) -> Self {
        Self {
            position_title: position.position_title.clone(),
            position_number: position.position_number.clone(),
            position_description: opt_string(position.position_description.as_ref()),
            department_id: opt_id(position.department_id.as_ref()),
            salary_range_id: opt_id(position.salary_range_id.as_ref()),
        }
    }
}

// =============================================================================
// Salary range
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalaryRangeForm {
    pub name: String,
    pub min_salary: String,
    pub max_salary: String,
}

impl SalaryRangeForm {
    /// # Errors
    ///
    /// Returns every failed rule keyed by field name.
    pub fn validate(&self, id: Option<SalaryRangeId>) -> Result<SalaryRangeCommand, FormErrors> {
        let mut errors = FormErrors::default();
        let name = required(&mut errors, "name", "Name", &self.name, 100);
        let min = required_salary(&mut errors, "minSalary", "Minimum salary", &self.min_salary);
        let max = required_salary(&mut errors, "maxSalary", "Maximum salary", &self.max_salary);

        let band = match (min, max) {
            (Some(min), Some(max)) => match SalaryBand::new(min, max) {
                Ok(band) => Some(band),
                Err(_) => {
                    errors.add("maxSalary", "Maximum salary must be greater than minimum salary");
                    None
                }
            },
            _ => None,
        };

        errors.into_result(|| Some(SalaryRangeCommand::new(id, name?, band?)))
    }
}

impl From<&SalaryRange> for SalaryRangeForm {
    fn from(range: &SalaryRange) -> Self {
        Self {
            name: range.name.clone(),
            min_salary: range.min_salary.amount().to_string(),
            max_salary: range.max_salary.amount().to_string(),
        }
    }
}

/// Row count posted by the "add mock positions" form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MockPositionsForm {
    pub row_count: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_employee() -> EmployeeForm {
        EmployeeForm {
            employee_number: "E-100".into(),
            first_name: " Grace ".into(),
            last_name: "Hopper".into(),
            date_of_birth: "1906-12-09".into(),
            gender: "1".into(),
            email: "grace@navy.mil".into(),
            phone_number: "555-0199".into(),
            hire_date: "1943-05-01".into(),
            salary: "$85,000.00".into(),
            department_id: DepartmentId::new(uuid::Uuid::new_v4()).to_string(),
            position_id: PositionId::new(uuid::Uuid::new_v4()).to_string(),
            salary_range_id: SalaryRangeId::new(uuid::Uuid::new_v4()).to_string(),
            ..EmployeeForm::default()
        }
    }

    #[test]
    fn test_valid_employee_becomes_command() {
        let command = valid_employee().validate(None).unwrap();
        assert_eq!(command.first_name, "Grace");
        assert_eq!(command.gender, Gender::Female);
        assert_eq!(command.salary.to_string(), "$85,000.00");
        assert!(command.prefix.is_none());
        assert_eq!(command.birthday.unwrap().to_string(), "1906-12-09");
    }

    #[test]
    fn test_employee_required_fields() {
        let errors = EmployeeForm::default().validate(None).unwrap_err();
        for field in [
            "employeeNumber",
            "firstName",
            "lastName",
            "dateOfBirth",
            "gender",
            "email",
            "phoneNumber",
            "hireDate",
            "salary",
            "departmentId",
            "positionId",
            "salaryRangeId",
        ] {
            assert!(errors.get(field).is_some(), "{field} should be required");
        }
        assert_eq!(errors.get("firstName"), Some("First name is required"));
        assert!(errors.get("prefix").is_none());
    }

    #[test]
    fn test_employee_lengths_and_ranges() {
        let mut form = valid_employee();
        form.prefix = "Professor Doctor".into();
        form.phone_number = "1".repeat(21);
        form.salary = "-1".into();
        form.email = "not-an-email".into();
        let errors = form.validate(None).unwrap_err();
        assert_eq!(errors.get("prefix"), Some("Prefix cannot exceed 10 characters"));
        assert!(errors.get("phoneNumber").is_some());
        assert_eq!(errors.get("salary"), Some("Salary cannot be negative"));
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
    }

    #[test]
    fn test_department_name_rules() {
        assert!(DepartmentForm { name: "  ".into() }.validate(None).is_err());
        let errors = DepartmentForm { name: "x".repeat(101) }.validate(None).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name cannot exceed 100 characters"));
        assert_eq!(
            DepartmentForm { name: "Finance".into() }.validate(None).unwrap().name,
            "Finance"
        );
    }

    #[test]
    fn test_position_rules() {
        let form = PositionForm {
            position_title: "Engineer".into(),
            position_number: "P-1".into(),
            position_description: "d".repeat(501),
            department_id: "not-a-uuid".into(),
            salary_range_id: SalaryRangeId::new(uuid::Uuid::new_v4()).to_string(),
        };
        let errors = form.validate(None).unwrap_err();
        assert!(errors.get("positionDescription").is_some());
        assert_eq!(errors.get("departmentId"), Some("Department is invalid"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_salary_range_min_below_max() {
        let form = SalaryRangeForm {
            name: "Band A".into(),
            min_salary: "60000".into(),
            max_salary: "40000".into(),
        };
        let errors = form.validate(None).unwrap_err();
        assert_eq!(
            errors.get("maxSalary"),
            Some("Maximum salary must be greater than minimum salary")
        );

        let ok = SalaryRangeForm {
            max_salary: "90000".into(),
            ..form
        }
        .validate(None)
        .unwrap();
        assert_eq!(ok.min_salary.to_string(), "$60,000.00");
    }

    #[test]
    fn test_employee_form_round_trips_record() {
        let command = valid_employee().validate(None).unwrap();
        let employee = Employee {
            id: EmployeeId::new(uuid::Uuid::new_v4()),
            employee_number: command.employee_number.clone(),
            prefix: None,
            first_name: command.first_name.clone(),
            middle_name: None,
            last_name: command.last_name.clone(),
            suffix: None,
            email: command.email.clone(),
            phone: Some(command.phone.clone()),
            address: None,
            birthday: command.birthday,
            hire_date: command.hire_date,
            gender: command.gender,
            salary: command.salary,
            department_id: Some(command.department_id),
            position_id: Some(command.position_id),
            salary_range_id: Some(command.salary_range_id),
        };
        let form = EmployeeForm::from(&employee);
        assert_eq!(form.date_of_birth, "1906-12-09");
        assert_eq!(form.validate(Some(employee.id)).unwrap().id, Some(employee.id));
    }
}
