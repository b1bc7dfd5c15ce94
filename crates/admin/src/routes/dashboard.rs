//! Dashboard route handler.

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use talent_core::Salary;
use tracing::instrument;

use crate::{
    api::{DashboardMetrics, percent_of},
    filters,
    middleware::RequireAuth,
    services::api_failure,
    state::AppState,
};

use super::{Layout, render};

/// Headline numbers.
#[derive(Debug, Clone, Default)]
pub struct MetricCards {
    pub employees: u64,
    pub departments: u64,
    pub positions: u64,
    pub salary_ranges: u64,
    pub new_hires: u64,
    pub average_salary: String,
}

/// One proportional bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarView {
    pub label: String,
    pub count: u64,
    pub percent: u64,
}

/// A titled group of bars.
#[derive(Debug, Clone)]
pub struct BarSection {
    pub heading: &'static str,
    pub bars: Vec<BarView>,
}

#[derive(Debug, Clone)]
pub struct RecentEmployeeView {
    pub href: String,
    pub name: String,
    pub position: String,
    pub department: String,
    pub added: String,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub loaded: bool,
    pub cards: MetricCards,
    pub sections: Vec<BarSection>,
    pub recent: Vec<RecentEmployeeView>,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format an API average as currency; non-finite values show as zero.
fn format_salary(amount: f64) -> String {
    Decimal::try_from(amount)
        .ok()
        .and_then(|d| Salary::new(d).ok())
        .unwrap_or(Salary::ZERO)
        .to_string()
}

fn bars<T>(items: &[T], label: impl Fn(&T) -> String, count: impl Fn(&T) -> u64) -> Vec<BarView> {
    let total: u64 = items.iter().map(&count).sum();
    items
        .iter()
        .map(|item| BarView {
            label: label(item),
            count: count(item),
            percent: percent_of(count(item), total),
        })
        .collect()
}

impl DashboardTemplate {
    fn new(layout: Layout, metrics: Option<DashboardMetrics>) -> Self {
        let Some(metrics) = metrics else {
            return Self {
                layout,
                loaded: false,
                cards: MetricCards {
                    average_salary: Salary::ZERO.to_string(),
                    ..MetricCards::default()
                },
                sections: Vec::new(),
                recent: Vec::new(),
            };
        };

        let gender = metrics.gender_distribution;
        Self {
            layout,
            loaded: true,
            cards: MetricCards {
                employees: metrics.total_employees,
                departments: metrics.total_departments,
                positions: metrics.total_positions,
                salary_ranges: metrics.total_salary_ranges,
                new_hires: metrics.new_hires_this_month,
                average_salary: format_salary(metrics.average_salary),
            },
            sections: vec![
                BarSection {
                    heading: "By department",
                    bars: bars(
                        &metrics.employees_by_department,
                        |m| m.department_name.clone(),
                        |m| m.employee_count,
                    ),
                },
                BarSection {
                    heading: "By position",
                    bars: bars(
                        &metrics.employees_by_position,
                        |m| m.position_title.clone(),
                        |m| m.employee_count,
                    ),
                },
                BarSection {
                    heading: "By salary range",
                    bars: bars(
                        &metrics.employees_by_salary_range,
                        |m| {
                            format!(
                                "{} ({} - {})",
                                m.range_name,
                                format_salary(m.min_salary),
                                format_salary(m.max_salary)
                            )
                        },
                        |m| m.employee_count,
                    ),
                },
                BarSection {
                    heading: "By gender",
                    bars: vec![
                        BarView {
                            label: "Male".to_string(),
                            count: gender.male,
                            percent: percent_of(gender.male, gender.total()),
                        },
                        BarView {
                            label: "Female".to_string(),
                            count: gender.female,
                            percent: percent_of(gender.female, gender.total()),
                        },
                    ],
                },
            ],
            recent: metrics
                .recent_employees
                .iter()
                .map(|e| RecentEmployeeView {
                    href: format!("/employees/{}", e.id),
                    name: e.full_name.clone(),
                    position: e.position_title.clone(),
                    department: e.department_name.clone(),
                    added: e.created_at.clone(),
                })
                .collect(),
        }
    }
}

/// Dashboard page handler.
#[instrument(skip(current, state))]
pub async fn dashboard(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> Response {
    let metrics = match state.api_for(&current.user).dashboard_metrics().await {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            if let Some(redirect) = api_failure::handle(&current.session, &e).await {
                return redirect.into_response();
            }
            None
        }
    };

    let layout = Layout::new(&state, &current, "/dashboard").await;
    render(&DashboardTemplate::new(layout, metrics))
}
