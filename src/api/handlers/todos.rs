use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::connection;
use crate::api::error::ApiResult;
use crate::api::extract::Admin;
use crate::api::server::AppState;
use crate::db::{read_ops, write_ops};
use crate::models::forms::{TodoForm, Validate};
use crate::models::tables::Todo;
use crate::models::views::Created;

/// GET /org/todo/
#[tracing::instrument(skip_all)]
pub async fn list_handler(Admin(_): Admin, State(state): State<AppState>) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(read_ops::list_todos(&state.pool, false).await?))
}

/// POST /org/todo/
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn create_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<TodoForm>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    let id = write_ops::insert_todo(&mut *conn, &form).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// PUT /org/todo/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn update_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<TodoForm>,
) -> ApiResult<StatusCode> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    write_ops::update_todo(&mut *conn, id, &form).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /org/todo/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn delete_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    let mut conn = connection(&state.pool).await?;
    write_ops::delete_todo(&mut *conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
