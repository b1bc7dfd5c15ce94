//! Employee list, detail and form handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use talent_core::{EmployeeId, Gender};
use tracing::instrument;

use crate::{
    api::{Department, Employee, PagedResponse, Position, SalaryRange},
    components::{DataTable, ListParams, SelectOption, data_table::employee_columns},
    error::AppError,
    filters,
    forms::{EmployeeForm, FormErrors},
    middleware::{
        CurrentSession, ManagerPolicy, RequireAuth, RequireManager, RequireRole, RolePolicy,
    },
    services::{api_failure, toast},
    state::AppState,
};

use super::{
    DeleteForm, DeleteMessages, Layout, delete_record, lookup, parse_id, related, render,
    save_failed,
};

const LIST_PATH: &str = "/employees";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(index))
        .route("/employees/create", get(new_form).post(create))
        .route("/employees/edit/{id}", get(edit_form).post(update))
        .route("/employees/{id}", get(show))
        .route("/employees/{id}/delete", post(delete))
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone)]
pub struct EmployeeRow {
    pub id: String,
    pub number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub hire_date: String,
    pub salary: String,
}

fn date_text(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

impl From<&Employee> for EmployeeRow {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.to_string(),
            number: employee.employee_number.clone(),
            name: employee.full_name(),
            email: employee.email.clone(),
            phone: employee.phone.clone().unwrap_or_default(),
            hire_date: date_text(employee.hire_date),
            salary: employee.salary.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeDetail {
    pub id: String,
    pub number: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birthday: String,
    pub hire_date: String,
    pub gender: &'static str,
    pub salary: String,
    pub department: String,
    pub position: String,
    pub salary_range: String,
}

#[derive(Template)]
#[template(path = "employees/index.html")]
pub struct EmployeesIndexTemplate {
    pub layout: Layout,
    pub table: DataTable,
    pub rows: Vec<EmployeeRow>,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "employees/show.html")]
pub struct EmployeeShowTemplate {
    pub layout: Layout,
    pub employee: EmployeeDetail,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "employees/form.html")]
pub struct EmployeeFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub form: EmployeeForm,
    pub errors: FormErrors,
    pub genders: Vec<SelectOption>,
    pub departments: Vec<SelectOption>,
    pub positions: Vec<SelectOption>,
    pub salary_ranges: Vec<SelectOption>,
}

/// Which form is being shown.
enum FormMode {
    Create,
    Edit(EmployeeId),
}

impl FormMode {
    const fn title(&self) -> &'static str {
        match self {
            Self::Create => "Create Employee",
            Self::Edit(_) => "Edit Employee",
        }
    }

    fn action(&self) -> String {
        match self {
            Self::Create => "/employees/create".to_string(),
            Self::Edit(id) => format!("/employees/edit/{id}"),
        }
    }

    fn cancel_href(&self) -> String {
        match self {
            Self::Create => LIST_PATH.to_string(),
            Self::Edit(id) => format!("/employees/{id}"),
        }
    }
}

/// Load the select box lists and render the form.
async fn render_form(
    state: &AppState,
    current: &CurrentSession,
    mode: &FormMode,
    form: EmployeeForm,
    errors: FormErrors,
) -> Response {
    let api = state.api_for(&current.user);
    let session = &current.session;
    let (departments, positions, salary_ranges) = tokio::join!(
        lookup::<Department>(&api, session, "departments"),
        lookup::<Position>(&api, session, "positions"),
        lookup::<SalaryRange>(&api, session, "salary ranges"),
    );
    let (departments, positions, salary_ranges) = match (departments, positions, salary_ranges) {
        (Ok(d), Ok(p), Ok(s)) => (d, p, s),
        (Err(redirect), _, _) | (_, Err(redirect), _) | (_, _, Err(redirect)) => {
            return redirect.into_response();
        }
    };

    let genders = Gender::ALL
        .iter()
        .map(|g| SelectOption {
            value: g.code().to_string(),
            label: g.label().to_string(),
            selected: g.code().to_string() == form.gender,
        })
        .collect();
    let template = EmployeeFormTemplate {
        layout: Layout::new(state, current, &mode.action()).await,
        title: mode.title(),
        action: mode.action(),
        cancel_href: mode.cancel_href(),
        genders,
        departments: SelectOption::list(
            &departments,
            &form.department_id,
            |d| d.id.to_string(),
            |d| d.name.clone(),
        ),
        positions: SelectOption::list(
            &positions,
            &form.position_id,
            |p| p.id.to_string(),
            |p| p.position_title.clone(),
        ),
        salary_ranges: SelectOption::list(
            &salary_ranges,
            &form.salary_range_id,
            |s| s.id.to_string(),
            |s| format!("{} ({})", s.name, s.band_label()),
        ),
        form,
        errors,
    };
    render(&template)
}

// =============================================================================
// Handlers
// =============================================================================

/// Paged employee list.
#[instrument(skip(current, state))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = params.to_page_query::<Employee>();
    let page = match state.api_for(&current.user).get_paged::<Employee>(&query).await {
        Ok(page) => page,
        Err(e) => {
            if let Some(redirect) = api_failure::handle(&current.session, &e).await {
                return redirect.into_response();
            }
            PagedResponse::new(Vec::new(), query.page_number, query.page_size, 0)
        }
    };

    let template = EmployeesIndexTemplate {
        table: DataTable::new(LIST_PATH, &employee_columns(), &query, &page)
            .search_placeholder("Search employees...")
            .empty_state("No employees found"),
        rows: page.items.iter().map(EmployeeRow::from).collect(),
        can_manage: ManagerPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, LIST_PATH).await,
    };
    render(&template)
}

/// Employee detail.
#[instrument(skip(current, state))]
pub async fn show(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: EmployeeId = parse_id(&id)?;
    let api = state.api_for(&current.user);
    let employee = match api.get_by_id::<Employee>(&id).await {
        Ok(employee) => employee,
        Err(e) => {
            let redirect = api_failure::handle(&current.session, &e).await;
            toast::error(&current.session, "Error loading employee").await;
            return Ok(redirect.unwrap_or_else(|| Redirect::to(LIST_PATH)).into_response());
        }
    };

    let (department, position, salary_range) = tokio::join!(
        related::<Department>(&api, employee.department_id.as_ref()),
        related::<Position>(&api, employee.position_id.as_ref()),
        related::<SalaryRange>(&api, employee.salary_range_id.as_ref()),
    );

    let detail = EmployeeDetail {
        id: employee.id.to_string(),
        number: employee.employee_number.clone(),
        full_name: employee.full_name(),
        email: employee.email.clone(),
        phone: employee.phone.clone().unwrap_or_else(|| "-".to_string()),
        address: employee.address.clone().unwrap_or_else(|| "-".to_string()),
        birthday: date_text(employee.birthday),
        hire_date: date_text(employee.hire_date),
        gender: employee.gender.label(),
        salary: employee.salary.to_string(),
        department: department.map_or_else(|| "-".to_string(), |d| d.name),
        position: position.map_or_else(|| "-".to_string(), |p| p.position_title),
        salary_range: salary_range
            .map_or_else(|| "-".to_string(), |s| format!("{} ({})", s.name, s.band_label())),
    };

    let path = format!("/employees/{id}");
    let template = EmployeeShowTemplate {
        employee: detail,
        can_manage: ManagerPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, &path).await,
    };
    Ok(render(&template))
}

/// Blank create form.
#[instrument(skip(current, state))]
pub async fn new_form(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
) -> Response {
    render_form(
        &state,
        &current,
        &FormMode::Create,
        EmployeeForm::new_employee(),
        FormErrors::default(),
    )
    .await
}

#[instrument(skip(current, state, form))]
pub async fn create(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Form(form): Form<EmployeeForm>,
) -> Response {
    let command = match form.validate(None) {
        Ok(command) => command,
        Err(errors) => {
            return render_form(&state, &current, &FormMode::Create, form, errors).await;
        }
    };

    match state.api_for(&current.user).create::<Employee>(&command).await {
        Ok(()) => {
            tracing::info!(employee_number = %command.employee_number, "Employee created");
            toast::success(&current.session, "Employee created successfully").await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => match save_failed(&current.session, &e, "Error creating employee").await {
            Some(redirect) => redirect.into_response(),
            None => {
                render_form(&state, &current, &FormMode::Create, form, FormErrors::default()).await
            }
        },
    }
}

/// Edit form prefilled from the record.
#[instrument(skip(current, state))]
pub async fn edit_form(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: EmployeeId = parse_id(&id)?;
    let employee = match state.api_for(&current.user).get_by_id::<Employee>(&id).await {
        Ok(employee) => employee,
        Err(e) => {
            let redirect = api_failure::handle(&current.session, &e).await;
            toast::error(&current.session, "Error loading employee").await;
            return Ok(redirect.unwrap_or_else(|| Redirect::to(LIST_PATH)).into_response());
        }
    };

    Ok(render_form(
        &state,
        &current,
        &FormMode::Edit(id),
        EmployeeForm::from(&employee),
        FormErrors::default(),
    )
    .await)
}

#[instrument(skip(current, state, form))]
pub async fn update(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<EmployeeForm>,
) -> Result<Response, AppError> {
    let id: EmployeeId = parse_id(&id)?;
    let mode = FormMode::Edit(id);
    let command = match form.validate(Some(id)) {
        Ok(command) => command,
        Err(errors) => return Ok(render_form(&state, &current, &mode, form, errors).await),
    };

    match state.api_for(&current.user).update::<Employee>(&id, &command).await {
        Ok(()) => {
            tracing::info!(%id, "Employee updated");
            toast::success(&current.session, "Employee updated successfully").await;
            Ok(Redirect::to(&format!("/employees/{id}")).into_response())
        }
        Err(e) => match save_failed(&current.session, &e, "Error updating employee").await {
            Some(redirect) => Ok(redirect.into_response()),
            None => Ok(render_form(&state, &current, &mode, form, FormErrors::default()).await),
        },
    }
}

#[instrument(skip(current, state, form))]
pub async fn delete(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let id: EmployeeId = parse_id(&id)?;
    let name = if form.name.trim().is_empty() {
        "Employee".to_string()
    } else {
        form.name.trim().to_string()
    };
    let messages = DeleteMessages {
        success: format!("{name} has been deleted."),
        failure: "Failed to delete employee. Please try again.".to_string(),
    };
    let api = state.api_for(&current.user);
    Ok(delete_record::<Employee>(&api, &current.session, &id, messages, LIST_PATH).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use talent_core::Salary;

    #[test]
    fn test_row_formats_fields() {
        let employee: Employee = serde_json::from_value(serde_json::json!({
            "id": "6f1c5a0e-3f4b-4f8e-9a55-0d2d1a8f1b11",
            "employeeNumber": "E-7",
            "firstName": "Katherine",
            "lastName": "Johnson",
            "email": "kj@example.com",
            "hireDate": "1953-06-01T00:00:00",
            "salary": 64000
        }))
        .unwrap();
        let row = EmployeeRow::from(&employee);
        assert_eq!(row.name, "Katherine Johnson");
        assert_eq!(row.hire_date, "1953-06-01");
        assert_eq!(row.salary, Salary::parse("64000").unwrap().to_string());
        assert_eq!(row.phone, "");
    }

    #[test]
    fn test_form_mode_paths() {
        let id = EmployeeId::new(uuid::Uuid::nil());
        let mode = FormMode::Edit(id);
        assert_eq!(mode.title(), "Edit Employee");
        assert_eq!(mode.action(), format!("/employees/edit/{id}"));
        assert_eq!(FormMode::Create.cancel_href(), "/employees");
    }
}
