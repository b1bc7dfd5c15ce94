//! Salary range list, detail and form handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use talent_core::SalaryRangeId;
use tracing::instrument;

use crate::{
    api::{PagedResponse, SalaryRange},
    components::{DataTable, ListParams, data_table::salary_range_columns},
    error::AppError,
    filters,
    forms::{FormErrors, SalaryRangeForm},
    middleware::{
        CurrentSession, HrAdminPolicy, RequireAuth, RequireHrAdmin, RequireRole, RolePolicy,
    },
    services::{api_failure, toast},
    state::AppState,
};

use super::{DeleteForm, DeleteMessages, Layout, delete_record, parse_id, render, save_failed};

const LIST_PATH: &str = "/salary-ranges";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salary-ranges", get(index))
        .route("/salary-ranges/create", get(new_form).post(create))
        .route("/salary-ranges/edit/{id}", get(edit_form).post(update))
        .route("/salary-ranges/{id}", get(show))
        .route("/salary-ranges/{id}/delete", post(delete))
}

#[derive(Debug, Clone)]
pub struct SalaryRangeRow {
    pub id: String,
    pub name: String,
    pub min_salary: String,
    pub max_salary: String,
}

impl From<&SalaryRange> for SalaryRangeRow {
    fn from(range: &SalaryRange) -> Self {
        Self {
            id: range.id.to_string(),
            name: range.name.clone(),
            min_salary: range.min_salary.to_string(),
            max_salary: range.max_salary.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "salary_ranges/index.html")]
pub struct SalaryRangesIndexTemplate {
    pub layout: Layout,
    pub table: DataTable,
    pub rows: Vec<SalaryRangeRow>,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "salary_ranges/show.html")]
pub struct SalaryRangeShowTemplate {
    pub layout: Layout,
    pub range: SalaryRangeRow,
    pub created: String,
    pub modified: String,
    pub can_manage: bool,
}

#[derive(Template)]
#[template(path = "salary_ranges/form.html")]
pub struct SalaryRangeFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub form: SalaryRangeForm,
    pub errors: FormErrors,
}

async fn render_form(
    state: &AppState,
    current: &CurrentSession,
    id: Option<SalaryRangeId>,
    form: SalaryRangeForm,
    errors: FormErrors,
) -> Response {
    let (title, action, cancel_href) = match id {
        None => (
            "Create Salary Range",
            "/salary-ranges/create".to_string(),
            LIST_PATH.to_string(),
        ),
        Some(id) => (
            "Edit Salary Range",
            format!("/salary-ranges/edit/{id}"),
            format!("/salary-ranges/{id}"),
        ),
    };
    render(&SalaryRangeFormTemplate {
        layout: Layout::new(state, current, &action).await,
        title,
        action,
        cancel_href,
        form,
        errors,
    })
}

async fn load(
    current: &CurrentSession,
    state: &AppState,
    id: &SalaryRangeId,
) -> Result<SalaryRange, Response> {
    match state.api_for(&current.user).get_by_id::<SalaryRange>(id).await {
        Ok(range) => Ok(range),
        Err(e) => {
            let redirect = api_failure::handle(&current.session, &e).await;
            toast::error(&current.session, "Error loading salary range").await;
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
    let query = params.to_page_query::<SalaryRange>();
    let page = match state
        .api_for(&current.user)
        .get_paged::<SalaryRange>(&query)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            if let Some(redirect) = api_failure::handle(&current.session, &e).await {
                return redirect.into_response();
            }
            PagedResponse::new(Vec::new(), query.page_number, query.page_size, 0)
        }
    };

    render(&SalaryRangesIndexTemplate {
        table: DataTable::new(LIST_PATH, &salary_range_columns(), &query, &page)
            .search_placeholder("Search salary ranges...")
            .empty_state("No salary ranges found"),
        rows: page.items.iter().map(SalaryRangeRow::from).collect(),
        can_manage: HrAdminPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, LIST_PATH).await,
    })
}

#[instrument(skip(current, state))]
pub async fn show(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: SalaryRangeId = parse_id(&id)?;
    let range = match load(&current, &state, &id).await {
        Ok(range) => range,
        Err(response) => return Ok(response),
    };

    Ok(render(&SalaryRangeShowTemplate {
        range: SalaryRangeRow::from(&range),
        created: range.created_at.unwrap_or_else(|| "-".to_string()),
        modified: range.last_modified_at.unwrap_or_else(|| "-".to_string()),
        can_manage: HrAdminPolicy::admits(&current.user),
        layout: Layout::new(&state, &current, &format!("/salary-ranges/{id}")).await,
    }))
}

#[instrument(skip(current, state))]
pub async fn new_form(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
) -> Response {
    render_form(&state, &current, None, SalaryRangeForm::default(), FormErrors::default()).await
}

#[instrument(skip(current, state, form))]
pub async fn create(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Form(form): Form<SalaryRangeForm>,
) -> Response {
    let command = match form.validate(None) {
        Ok(command) => command,
        Err(errors) => return render_form(&state, &current, None, form, errors).await,
    };

    match state
        .api_for(&current.user)
        .create::<SalaryRange>(&command)
        .await
    {
        Ok(()) => {
            tracing::info!(name = %command.name, "Salary range created");
            toast::success(&current.session, "Salary range created successfully").await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => match save_failed(&current.session, &e, "Error creating salary range").await {
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
    let id: SalaryRangeId = parse_id(&id)?;
    let range = match load(&current, &state, &id).await {
        Ok(range) => range,
        Err(response) => return Ok(response),
    };
    let form = SalaryRangeForm::from(&range);
    Ok(render_form(&state, &current, Some(id), form, FormErrors::default()).await)
}

#[instrument(skip(current, state, form))]
pub async fn update(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<SalaryRangeForm>,
) -> Result<Response, AppError> {
    let id: SalaryRangeId = parse_id(&id)?;
    let command = match form.validate(Some(id)) {
        Ok(command) => command,
        Err(errors) => return Ok(render_form(&state, &current, Some(id), form, errors).await),
    };

    match state
        .api_for(&current.user)
        .update::<SalaryRange>(&id, &command)
        .await
    {
        Ok(()) => {
            tracing::info!(%id, "Salary range updated");
            toast::success(&current.session, "Salary range updated successfully").await;
            Ok(Redirect::to(&format!("/salary-ranges/{id}")).into_response())
        }
        Err(e) => match save_failed(&current.session, &e, "Error updating salary range").await {
            Some(redirect) => Ok(redirect.into_response()),
            None => {
                Ok(render_form(&state, &current, Some(id), form, FormErrors::default()).await)
            }
        },
    }
}

#[instrument(skip(current, state, form))]
pub async fn delete(
    RequireRole(current, _): RequireHrAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let id: SalaryRangeId = parse_id(&id)?;
    let messages = DeleteMessages {
        success: format!("\"{}\" has been deleted.", form.name.trim()),
        failure: "Failed to delete salary range. Please try again.".to_string(),
    };
    let api = state.api_for(&current.user);
    Ok(delete_record::<SalaryRange>(&api, &current.session, &id, messages, LIST_PATH).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use talent_core::Salary;

    #[test]
    fn test_row_formats_band() {
        let range = SalaryRange {
            id: SalaryRangeId::new(uuid::Uuid::new_v4()),
            name: "Band B".to_string(),
            min_salary: Salary::parse("40000").unwrap(),
            max_salary: Salary::parse("$60,000.50").unwrap(),
            created_at: None,
            last_modified_at: None,
        };
        let row = SalaryRangeRow::from(&range);
        assert_eq!(row.min_salary, "$40,000.00");
        assert_eq!(row.max_salary, "$60,000.50");
    }
}
