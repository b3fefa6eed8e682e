use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::connection;
use crate::api::error::ApiResult;
use crate::api::extract::Admin;
use crate::api::server::AppState;
use crate::db::{read_ops, write_ops};
use crate::models::forms::{PoiForm, Validate};
use crate::models::tables::Poi;
use crate::models::views::Created;

/// GET /org/poi/
#[tracing::instrument(skip_all)]
pub async fn list_handler(Admin(_): Admin, State(state): State<AppState>) -> ApiResult<Json<Vec<Poi>>> {
    Ok(Json(read_ops::list_poi(&state.pool).await?))
}

/// POST /org/poi/
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn create_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<PoiForm>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    let id = write_ops::insert_poi(&mut *conn, &form).await?;

    info!(poi_id = id, title = %form.title, "Added point of interest");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// PUT /org/poi/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn update_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<PoiForm>,
) -> ApiResult<StatusCode> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    write_ops::update_poi(&mut *conn, id, &form).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /org/poi/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn delete_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    let mut conn = connection(&state.pool).await?;
    write_ops::delete_poi(&mut *conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
