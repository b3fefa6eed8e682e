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
use crate::domain::summary::sales_view;
use crate::models::forms::{ProductForm, Validate};
use crate::models::views::{Created, ProductSalesView};

/// GET /org/products/
/// Every product with its price and how many have been sold.
#[tracing::instrument(skip_all)]
pub async fn list_handler(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ProductSalesView>>> {
    let sales = read_ops::product_sales(&state.pool).await?;
    let currency = &state.settings.currency;

    let views = sales
        .iter()
        .map(|s| sales_view(s, currency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(views))
}

/// POST /org/products/
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn create_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    let id = write_ops::insert_product(&mut *conn, &form).await?;

    info!(product_id = id, name = %form.name, cost = %form.cost, "Added product");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// PUT /org/products/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn update_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> ApiResult<StatusCode> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    write_ops::update_product(&mut *conn, id, &form).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /org/products/{id}
/// Products that have been bought cannot be deleted.
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn delete_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    let mut conn = connection(&state.pool).await?;
    write_ops::delete_product(&mut *conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
