use serde::{Deserialize, Serialize};
use talent_core::{DepartmentId, PositionId, SalaryRangeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub position_title: String,
    #[serde(default)]
    pub position_number: String,
    pub position_description: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub salary_range_id: Option<SalaryRangeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PositionId>,
    pub position_title: String,
    pub position_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_description: Option<String>,
    pub department_id: DepartmentId,
    pub salary_range_id: SalaryRangeId,
}

/// Body of `POST /Positions/AddMock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertMockPositionsCommand {
    pub row_count: u32,
}

impl InsertMockPositionsCommand {
    pub const MAX_ROWS: u32 = 100;

    /// Accepts 1 to 100 rows.
    #[must_use]
    pub const fn new(row_count: u32) -> Option<Self> {
        if row_count >= 1 && row_count <= Self::MAX_ROWS {
            Some(Self { row_count })
        } else {
            None
        }
    }
}
