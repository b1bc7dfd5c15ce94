//! `GET /Dashboard/Metrics`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_employees: u64,
    pub total_departments: u64,
    pub total_positions: u64,
    pub total_salary_ranges: u64,
    pub new_hires_this_month: u64,
    pub average_salary: f64,
    #[serde(default)]
    pub employees_by_department: Vec<DepartmentMetric>,
    #[serde(default)]
    pub employees_by_position: Vec<PositionMetric>,
    #[serde(default)]
    pub employees_by_salary_range: Vec<SalaryRangeMetric>,
    #[serde(default)]
    pub gender_distribution: GenderMetric,
    #[serde(default)]
    pub recent_employees: Vec<RecentEmployee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentMetric {
    pub department_id: String,
    pub department_name: String,
    pub employee_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMetric {
    pub position_id: String,
    pub position_title: String,
    pub employee_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRangeMetric {
    pub salary_range_id: String,
    pub range_name: String,
    pub min_salary: f64,
    pub max_salary: f64,
    pub employee_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct GenderMetric {
    #[serde(default)]
    pub male: u64,
    #[serde(default)]
    pub female: u64,
}

impl GenderMetric {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.male + self.female
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEmployee {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub position_title: String,
    #[serde(default)]
    pub department_name: String,
    #[serde(default)]
    pub created_at: String,
}

/// Share of `count` in `total` as a whole percentage, for bar widths.
#[must_use]
pub fn percent_of(count: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (count * 100 + total / 2) / total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_tolerate_missing_breakdowns() {
        let metrics: DashboardMetrics = serde_json::from_str(
            r#"{"totalEmployees":10,"totalDepartments":2,"totalPositions":3,
                "totalSalaryRanges":4,"newHiresThisMonth":1,"averageSalary":55000.0}"#,
        )
        .unwrap();
        assert_eq!(metrics.total_employees, 10);
        assert!(metrics.recent_employees.is_empty());
        assert_eq!(metrics.gender_distribution.total(), 0);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(5, 0), 0);
    }
}
