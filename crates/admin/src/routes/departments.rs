//! Department list, detail and form handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use talent_core::DepartmentId;
use tracing::instrument;

use crate::{
    api::{Department, PagedResponse},
    components::{DataTable, ListParams, data_table::department_columns},
    error::AppError,
    filters,
    forms::{DepartmentForm, FormErrors},
    middleware::{
        CurrentSession, ManagerPolicy, RequireAuth, RequireManager, RequireRole, RolePolicy,
    },
    services::{api_failure, toast},
    state::AppState,
};

use super::{DeleteForm, DeleteMessages, Layout, delete_record, parse_id, render, save_failed};

const LIST_PATH: &str = "/departments";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(index))
        .route("/departments/create", get(new_form).post(create))
        .route("/departments/edit/{id}", get(edit_form).post(update))
        .route("/departments/{id}", get(show))
        .route("/departments/{id}/delete", post(delete))
}

#[derive(Debug, Clone)]
pub struct DepartmentRow {
    pub id: String,
    pub name: String,
    pub created: String,
}

impl From<&Department> for DepartmentRow {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id.to_string(),
            name: department.name.clone(),
            created: department
                .created_at
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Template)]
#[template(path = "departments/index.html")]
pub struct DepartmentsIndexTemplate {
    pub layout: Layout,
    pub table: DataTable,
    pub rows: Vec<DepartmentRow>,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "departments/show.html")]
pub struct DepartmentShowTemplate {
    pub layout: Layout,
    pub department: DepartmentRow,
    pub modified: String,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "departments/form.html")]
pub struct DepartmentFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub form: DepartmentForm,
    pub errors: FormErrors,
}

async fn render_form(
    state: &AppState,
    current: &CurrentSession,
    id: Option<DepartmentId>,
    form: DepartmentForm,
    errors: FormErrors,
) -> Response {
    let (title, action, cancel_href) = match id {
        None => (
            "Create Department",
            "/departments/create".to_string(),
            LIST_PATH.to_string(),
        ),
        Some(id) => (
            "Edit Department",
            format!("/departments/edit/{id}"),
            format!("/departments/{id}"),
        ),
    };
    render(&DepartmentFormTemplate {
        layout: Layout::new(state, current, &action).await,
        title,
        action,
        cancel_href,
        form,
        errors,
    })
}

/// Load one department or leave for the list with `Error loading department`.
async fn load(
    current: &CurrentSession,
    state: &AppState,
    id: &DepartmentId,
) -> Result<Department, Response> {
    match state.api_for(&current.user).get_by_id::<Department>(id).await {
        Ok(department) => Ok(department),
        Err(e) => {
            let redirect = api_failure::handle(&current.session, &e).await;
            toast::error(&current.session, "Error loading department").await;
            Err(redirect
                .unwrap_or_else(|| Redirect::to(LIST_PATH))
                .into_response())
        }
    }
}

#[instrument(skip(current, state))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = params.to_page_query::<Department>();
    let page = match state.api_for(&current.user).get_paged::<Department>(&query).await {
        Ok(page) => page,
        Err(e) => {
            if let Some(redirect) = api_failure::handle(&current.session, &e).await {
                return redirect.into_response();
            }
            PagedResponse::new(Vec::new(), query.page_number, query.page_size, 0)
        }
    };

    render(&DepartmentsIndexTemplate {
        table: DataTable::new(LIST_PATH, &department_columns(), &query, &page)
            .search_placeholder("Search departments...")
            .empty_state("No departments found"),
        rows: page.items.iter().map(DepartmentRow::from).collect(),
        can_manage: ManagerPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, LIST_PATH).await,
    })
}

#[instrument(skip(current, state))]
pub async fn show(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: DepartmentId = parse_id(&id)?;
    let department = match load(&current, &state, &id).await {
        Ok(department) => department,
        Err(response) => return Ok(response),
    };

    Ok(render(&DepartmentShowTemplate {
        modified: department
            .last_modified_at
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        department: DepartmentRow::from(&department),
        can_manage: ManagerPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, &format!("/departments/{id}")).await,
    }))
}

#[instrument(skip(current, state))]
pub async fn new_form(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
) -> Response {
    render_form(&state, &current, None, DepartmentForm::default(), FormErrors::default()).await
}

#[instrument(skip(current, state, form))]
pub async fn create(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Form(form): Form<DepartmentForm>,
) -> Response {
    let command = match form.validate(None) {
        Ok(command) => command,
        Err(errors) => return render_form(&state, &current, None, form, errors).await,
    };

    match state.api_for(&current.user).create::<Department>(&command).await {
        Ok(()) => {
            tracing::info!(name = %command.name, "Department created");
            toast::success(&current.session, "Department created successfully").await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => match save_failed(&current.session, &e, "Error creating department").await {
            Some(redirect) => redirect.into_response(),
            None => render_form(&state, &current, None, form, FormErrors::default()).await,
        },
    }
}

#[instrument(skip(current, state))]
pub async fn edit_form(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: DepartmentId = parse_id(&id)?;
    let department = match load(&current, &state, &id).await {
        Ok(department) => department,
        Err(response) => return Ok(response),
    };
    let form = DepartmentForm::from(&department);
    Ok(render_form(&state, &current, Some(id), form, FormErrors::default()).await)
}

#[instrument(skip(current, state, form))]
pub async fn update(
    RequireRole(current, _): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DepartmentForm>,
) -> Result<Response, AppError> {
    let id: DepartmentId = parse_id(&id)?;
    let command = match form.validate(Some(id)) {
        Ok(command) => command,
        Err(errors) => return Ok(render_form(&state, &current, Some(id), form, errors).await),
    };

    match state
        .api_for(&current.user)
        .update::<Department>(&id, &command)
        .await
    {
        Ok(()) => {
            tracing::info!(%id, "Department updated");
            toast::success(&current.session, "Department updated successfully").await;
            Ok(Redirect::to(&format!("/departments/{id}")).into_response())
        }
        Err(e) => match save_failed(&current.session, &e, "Error updating department").await {
            Some(redirect) => Ok(redirect.into_response()),
            None => {
                Ok(render_form(&state, &current, Some(id), form, FormErrors::default()).await)
            }
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
    let id: DepartmentId = parse_id(&id)?;
    let messages = DeleteMessages {
        success: format!("\"{}\" has been deleted.", form.name.trim()),
        failure: "Failed to delete department. Please try again.".to_string(),
    };
    let api = state.api_for(&current.user);
    Ok(delete_record::<Department>(&api, &current.session, &id, messages, LIST_PATH).await)
}
