//! Position list, detail and form handlers, plus mock data generation.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use talent_core::PositionId;
use tracing::instrument;

use crate::{
    api::{Department, InsertMockPositionsCommand, PagedResponse, Position, SalaryRange},
    components::{DataTable, ListParams, SelectOption, data_table::position_columns},
    error::AppError,
    filters,
    forms::{FormErrors, MockPositionsForm, PositionForm},
    middleware::{
        CurrentSession, HrAdminPolicy, RequireAuth, RequireHrAdmin, RequireRole, RolePolicy,
    },
    services::{api_failure, toast},
    state::AppState,
};

use super::{
    DeleteForm, DeleteMessages, Layout, delete_record, lookup, parse_id, related, render,
    save_failed,
};

const LIST_PATH: &str = "/positions";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/positions", get(index))
        .route("/positions/create", get(new_form).post(create))
        .route("/positions/add-mock", post(add_mock))
        .route("/positions/edit/{id}", get(edit_form).post(update))
        .route("/positions/{id}", get(show))
        .route("/positions/{id}/delete", post(delete))
}

#[derive(Debug, Clone)]
pub struct PositionRow {
    pub id: String,
    pub number: String,
    pub title: String,
    pub description: String,
}

impl From<&Position> for PositionRow {
    fn from(position: &Position) -> Self {
        Self {
            id: position.id.to_string(),
            number: position.position_number.clone(),
            title: position.position_title.clone(),
            description: position.position_description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "positions/index.html")]
pub struct PositionsIndexTemplate {
    pub layout: Layout,
    pub table: DataTable,
    pub rows: Vec<PositionRow>,
    pub can_manage: bool,
    pub max_mock_rows: u32,
}

#[derive(Template)]
#[template(path = "positions/show.html")]
pub struct PositionShowTemplate {
    pub layout: Layout,
    pub position: PositionRow,
    pub department: String,
    pub salary_range: String,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "positions/form.html")]
pub struct PositionFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub form: PositionForm,
    pub errors: FormErrors,
    pub departments: Vec<SelectOption>,
    pub salary_ranges: Vec<SelectOption>,
}

async fn render_form(
    state: &AppState,
    current: &CurrentSession,
    id: Option<PositionId>,
    form: PositionForm,
    errors: FormErrors,
) -> Response {
    let api = state.api_for(&current.user);
    let session = &current.session;
    let (departments, salary_ranges) = tokio::join!(
        lookup::<Department>(&api, session, "departments"),
        lookup::<SalaryRange>(&api, session, "salary ranges"),
    );
    let (departments, salary_ranges) = match (departments, salary_ranges) {
        (Ok(d), Ok(s)) => (d, s),
        (Err(redirect), _) | (_, Err(redirect)) => return redirect.into_response(),
    };

    let (title, action, cancel_href) = match id {
        None => (
            "Create Position",
            "/positions/create".to_string(),
            LIST_PATH.to_string(),
        ),
        Some(id) => (
            "Edit Position",
            format!("/positions/edit/{id}"),
            format!("/positions/{id}"),
        ),
    };
    render(&PositionFormTemplate {
        layout: Layout::new(state, current, &action).await,
        title,
        action,
        cancel_href,
        departments: SelectOption::list(
            &departments,
            &form.department_id,
            |d| d.id.to_string(),
            |d| d.name.clone(),
        ),
        salary_ranges: SelectOption::list(
            &salary_ranges,
            &form.salary_range_id,
            |s| s.id.to_string(),
            |s| format!("{} ({})", s.name, s.band_label()),
        ),
        form,
        errors,
    })
}

async fn load(
    current: &CurrentSession,
    state: &AppState,
    id: &PositionId,
) -> Result<Position, Response> {
    match state.api_for(&current.user).get_by_id::<Position>(id).await {
        Ok(position) => Ok(position),
        Err(e) => {
            let redirect = api_failure::handle(&current.session, &e).await;
            toast::error(&current.session, "Error loading position").await;
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
    let query = params.to_page_query::<Position>();
    let page = match state.api_for(&current.user).get_paged::<Position>(&query).await {
        Ok(page) => page,
        Err(e) => {
            if let Some(redirect) = api_failure::handle(&current.session, &e).await {
                return redirect.into_response();
            }
            PagedResponse::new(Vec::new(), query.page_number, query.page_size, 0)
        }
    };

    render(&PositionsIndexTemplate {
        table: DataTable::new(LIST_PATH, &position_columns(), &query, &page)
            .search_placeholder("Search positions...")
            .empty_state("No positions found"),
        rows: page.items.iter().map(PositionRow::from).collect(),
        can_manage: HrAdminPolicy::admits(&current.user),
        max_mock_rows: InsertMockPositionsCommand::MAX_ROWS,
        layout: Layout::new(&state, &current, LIST_PATH).await,
    })
}

#[instrument(skip(current, state))]
pub async fn show(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: PositionId = parse_id(&id)?;
    let position = match load(&current, &state, &id).await {
        Ok(position) => position,
        Err(response) => return Ok(response),
    };

    let api = state.api_for(&current.user);
    let (department, salary_range) = tokio::join!(
        related::<Department>(&api, position.department_id.as_ref()),
        related::<SalaryRange>(&api, position.salary_range_id.as_ref()),
    );

    Ok(render(&PositionShowTemplate {
        position: PositionRow::from(&position),
        department: department.map_or_else(|| "-".to_string(), |d| d.name),
        salary_range: salary_range
            .map_or_else(|| "-".to_string(), |s| format!("{} ({})", s.name, s.band_label())),
        can_manage: HrAdminPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, &format!("/positions/{id}")).await,
    }))
}

#[instrument(skip(current, state))]
pub async fn new_form(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
) -> Response {
    render_form(&state, &current, None, PositionForm::default(), FormErrors::default()).await
}

#[instrument(skip(current, state, form))]
pub async fn create(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Form(form): Form<PositionForm>,
) -> Response {
    let command = match form.validate(None) {
        Ok(command) => command,
        Err(errors) => return render_form(&state, &current, None, form, errors).await,
    };

    match state.api_for(&current.user).create::<Position>(&command).await {
        Ok(()) => {
            tracing::info!(position_number = %command.position_number, "Position created");
            toast::success(&current.session, "Position created successfully").await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => match save_failed(&current.session, &e, "Error creating position").await {
            Some(redirect) => redirect.into_response(),
            None => render_form(&state, &current, None, form, FormErrors::default()).await,
        },
    }
}

#[instrument(skip(current, state))]
pub async fn edit_form(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: PositionId = parse_id(&id)?;
    let position = match load(&current, &state, &id).await {
        Ok(position) => position,
        Err(response) => return Ok(response),
    };
    let form = PositionForm::from(&position);
    Ok(render_form(&state, &current, Some(id), form, FormErrors::default()).await)
}

#[instrument(skip(current, state, form))]
pub async fn update(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PositionForm>,
) -> Result<Response, AppError> {
    let id: PositionId = parse_id(&id)?;
    let command = match form.validate(Some(id)) {
        Ok(command) => command,
        Err(errors) => return Ok(render_form(&state, &current, Some(id), form, errors).await),
    };

    match state.api_for(&current.user).update::<Position>(&id, &command).await {
        Ok(()) => {
            tracing::info!(%id, "Position updated");
            toast::success(&current.session, "Position updated successfully").await;
            Ok(Redirect::to(&format!("/positions/{id}")).into_response())
        }
        Err(e) => match save_failed(&current.session, &e, "Error updating position").await {
            Some(redirect) => Ok(redirect.into_response()),
            None => {
                Ok(render_form(&state, &current, Some(id), form, FormErrors::default()).await)
            }
        },
    }
}

/// Toast texts for a delete posted from `from` (`list` or the detail page).
fn delete_messages(name: &str, from: &str) -> DeleteMessages {
    if from == "list" {
        DeleteMessages {
            success: "Position deleted successfully".to_string(),
            failure: "Error deleting position".to_string(),
        }
    } else {
        DeleteMessages {
            success: format!("\"{}\" has been deleted.", name.trim()),
            failure: "Failed to delete position. Please try again.".to_string(),
        }
    }
}

#[instrument(skip(current, state, form))]
pub async fn delete(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let id: PositionId = parse_id(&id)?;
    let messages = delete_messages(&form.name, &form.from);
    let api = state.api_for(&current.user);
    Ok(delete_record::<Position>(&api, &current.session, &id, messages, LIST_PATH).await)
}

/// POST /positions/add-mock
#[instrument(skip(current, state, form))]
pub async fn add_mock(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Form(form): Form<MockPositionsForm>,
) -> Response {
    let Some(command) = form
        .row_count
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(InsertMockPositionsCommand::new)
    else {
        toast::error(&current.session, "Please enter a number between 1 and 100").await;
        return Redirect::to(LIST_PATH).into_response();
    };

    match state
        .api_for(&current.user)
        .add_mock_positions(command)
        .await
    {
        Ok(()) => {
            tracing::info!(row_count = command.row_count, "Mock positions added");
            toast::success(
                &current.session,
                format!("{} mock positions added successfully", command.row_count),
            )
            .await;
        }
        Err(e) => {
            if let Some(redirect) = api_failure::handle(&current.session, &e).await {
                return redirect.into_response();
            }
            toast::error(&current.session, "Error adding mock positions").await;
        }
    }
    Redirect::to(LIST_PATH).into_response()
}
