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
use crate::models::forms::{PaymentForm, Validate};
use crate::models::views::{Created, PaymentView};

/// GET /org/payments/
#[tracing::instrument(skip_all)]
pub async fn list_handler(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentView>>> {
    let payments = read_ops::list_payments(&state.pool).await?;
    let currency = &state.settings.currency;

    Ok(Json(
        payments
            .into_iter()
            .map(|p| PaymentView::new(p, currency))
            .collect(),
    ))
}

/// POST /org/payments/
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn create_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<PaymentForm>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    let id = write_ops::insert_payment(&mut *conn, &form).await?;

    info!(payment_id = id, payer = form.payer, value = %form.value, "Recorded payment");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// PUT /org/payments/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn update_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<PaymentForm>,
) -> ApiResult<StatusCode> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    write_ops::update_payment(&mut *conn, id, &form).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /org/payments/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn delete_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    let mut conn = connection(&state.pool).await?;
    write_ops::delete_payment(&mut *conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
