use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::auth::basic::AdminValidator;
use crate::models::tables::Person;

/// An authenticated organizer. Extracting it runs Basic authentication
/// against the person table; handlers that take it are admin-only.
#[derive(Debug, Clone)]
pub struct Admin(pub Person);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let person = AdminValidator::validate(&state.pool, &state.tokens, auth_header).await?;
        Ok(Admin(person))
    }
}
