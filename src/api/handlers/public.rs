use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::db::read_ops;
use crate::domain::{self, attendee::{ATTENDEE_AUTH_REQUIRED, BUY_FAILED}};
use crate::models::views::{AttendeePage, MapView, SiteInfo};

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    #[serde(default)]
    pub auth: Option<String>,
}

/// GET /
pub async fn index_handler(State(state): State<AppState>) -> Json<SiteInfo> {
    Json(SiteInfo {
        title: state.settings.site_title.clone(),
        registration_open: state.settings.registration_open,
        currency: state.settings.currency.clone(),
    })
}

/// GET /map/
#[tracing::instrument(skip(state))]
pub async fn map_handler(State(state): State<AppState>) -> ApiResult<Json<MapView>> {
    let poi = read_ops::list_poi(&state.pool).await?;
    let bounds = domain::bounds(&poi);

    info!(points = poi.len(), "Serving map");

    Ok(Json(MapView {
        poi,
        bounds,
        mapbox_access_token: state.settings.mapbox_token.clone(),
    }))
}

/// GET /attendee/{id}?auth=
/// A malformed id is refused the same way as a wrong token.
#[tracing::instrument(skip(state, query))]
pub async fn attendee_handler(
    Path(id): Path<String>,
    Query(query): Query<AuthQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<AttendeePage>> {
    let id = id
        .parse::<i64>()
        .map_err(|_| ApiError::Unauthorized(ATTENDEE_AUTH_REQUIRED.to_string()))?;
    let auth = query
        .auth
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized(ATTENDEE_AUTH_REQUIRED.to_string()))?;

    let page = domain::attendee_page(
        &state.pool,
        &state.tokens,
        &state.settings.currency,
        id,
        Some(auth),
    )
    .await?;

    Ok(Json(page))
}

fn buy_params(params: &HashMap<String, String>) -> Option<(i64, i64, &str)> {
    let item = params.get("item")?.parse().ok()?;
    let buyer = params.get("buyer")?.parse().ok()?;
    let auth = params.get("auth")?;
    Some((item, buyer, auth.as_str()))
}

/// GET /buy?item=&buyer=&auth=
/// Every failure looks the same to the caller.
#[tracing::instrument(skip(state, params))]
pub async fn buy_handler(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> ApiResult<Redirect> {
    let (item, buyer, auth) =
        buy_params(&params).ok_or_else(|| ApiError::NotFound(BUY_FAILED.to_string()))?;

    let person = domain::buy_item(&state.pool, &state.tokens, item, buyer, auth).await?;

    Ok(Redirect::to(&format!(
        "/attendee/{}?auth={}",
        person.id,
        state.tokens.person_token(person.id)
    )))
}
