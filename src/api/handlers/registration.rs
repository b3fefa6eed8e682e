use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::domain::{self, registration};
use crate::models::forms::RegistrationForm;
use crate::models::views::{Registered, RegistrationOptions};

#[derive(Debug, Deserialize)]
pub struct PreregistrationQuery {
    #[serde(default)]
    pub preregistration: Option<String>,
}

/// GET /register
#[tracing::instrument(skip(state, query))]
pub async fn options_handler(
    Query(query): Query<PreregistrationQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<RegistrationOptions>> {
    let open = state.settings.registration_open;
    registration::check_open(open, &state.tokens, query.preregistration.as_deref())?;

    let options = registration::registration_options(&state.pool, open).await?;
    Ok(Json(options))
}

/// POST /register
#[tracing::instrument(skip_all)]
pub async fn register_handler(
    Query(query): Query<PreregistrationQuery>,
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> ApiResult<(StatusCode, Json<Registered>)> {
    info!("Processing registration");

    registration::check_open(
        state.settings.registration_open,
        &state.tokens,
        query.preregistration.as_deref(),
    )?;

    let registered = domain::register(
        &state.pool,
        &state.settings,
        &state.tokens,
        state.mailer.as_ref(),
        form,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(registered)))
}
