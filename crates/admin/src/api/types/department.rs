use serde::{Deserialize, Serialize};
use talent_core::DepartmentId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub created_at: Option<String>,
    pub last_modified_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DepartmentId>,
    pub name: String,
}
