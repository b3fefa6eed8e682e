use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::connection;
use crate::api::error::ApiResult;
use crate::api::extract::Admin;
use crate::api::server::AppState;
use crate::db::read_ops::{self, PurchaseFilter};
use crate::db::write_ops;
use crate::models::forms::{PurchaseForm, Validate};
use crate::models::money::Money;
use crate::models::views::{Amount, Created, PurchaseList, PurchaseView};

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseQuery {
    #[serde(default)]
    pub person: Option<i64>,
    #[serde(default)]
    pub product: Option<i64>,
}

/// GET /org/purchases/?person=&product=
#[tracing::instrument(skip(state, _admin))]
pub async fn list_handler(
    _admin: Admin,
    Query(query): Query<PurchaseQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<PurchaseList>> {
    let person = match query.person {
        Some(id) => Some(read_ops::get_person(&state.pool, id).await?),
        None => None,
    };
    let product = match query.product {
        Some(id) => Some(read_ops::get_product(&state.pool, id).await?),
        None => None,
    };

    let filter = PurchaseFilter {
        buyer: query.person,
        item: query.product,
    };
    let purchases = read_ops::list_purchases(&state.pool, filter).await?;

    let currency = &state.settings.currency;
    let total = Money::try_total(purchases.iter().map(|p| p.total()))?;
    let purchases = purchases
        .into_iter()
        .map(|p| PurchaseView::new(p, currency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(PurchaseList {
        person,
        product,
        purchases,
        total: Amount::new(total, currency),
    }))
}

/// POST /org/purchases/
/// Recorded as bought today.
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn create_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<PurchaseForm>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    let id = write_ops::insert_purchase(
        &mut *conn,
        form.buyer,
        form.item,
        form.quantity,
        Utc::now().date_naive(),
        form.complimentary,
    )
    .await?;

    info!(purchase_id = id, buyer = form.buyer, item = form.item, "Recorded purchase");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// PUT /org/purchases/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn update_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<PurchaseForm>,
) -> ApiResult<StatusCode> {
    form.validate()?;

    let mut conn = connection(&state.pool).await?;
    write_ops::update_purchase(&mut *conn, id, &form).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /org/purchases/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn delete_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    let mut conn = connection(&state.pool).await?;
    write_ops::delete_purchase(&mut *conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
