use axum::{extract::State, Json};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::extract::Admin;
use crate::api::server::AppState;
use crate::domain;
use crate::models::views::Summary;

/// GET /org/
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn summary_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Summary>> {
    info!("Building organizer summary");

    let summary = domain::build_summary(
        &state.pool,
        &state.tokens,
        &state.settings.currency,
        state.settings.registration_open,
    )
    .await?;

    Ok(Json(summary))
}
