use serde::{Deserialize, Serialize};
use talent_core::{Salary, SalaryBand, SalaryRangeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub id: SalaryRangeId,
    pub name: String,
    pub min_salary: Salary,
    pub max_salary: Salary,
    pub created_at: Option<String>,
    pub last_modified_at: Option<String>,
}

impl SalaryRange {
    /// `"$40,000.00 - $60,000.00"`.
    #[must_use]
    pub fn band_label(&self) -> String {
        format!("{} - {}", self.min_salary, self.max_salary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRangeCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SalaryRangeId>,
    pub name: String,
    pub min_salary: Salary,
    pub max_salary: Salary,
}

impl SalaryRangeCommand {
    /// Build a command from a validated band.
    #[must_use]
    pub fn new(id: Option<SalaryRangeId>, name: String, band: SalaryBand) -> Self {
        Self {
            id,
            name,
            min_salary: band.min(),
            max_salary: band.max(),
        }
    }
}
