// API handlers - thin HTTP orchestration layer
// Handlers only deal with HTTP concerns:
// 1. Extract parameters from request
// 2. Perform authentication/authorization
// 3. Call domain logic
// 4. Transform domain result to HTTP response
//
// Everything under /org/ takes the `Admin` extractor.

pub mod admin;
pub mod attendees;
pub mod payments;
pub mod poi;
pub mod products;
pub mod public;
pub mod purchases;
pub mod registration;
pub mod todos;

use sqlx::{pool::PoolConnection, PgPool, Postgres};

use crate::api::error::{ApiError, ApiResult};

pub(crate) async fn connection(pool: &PgPool) -> ApiResult<PoolConnection<Postgres>> {
    pool.acquire()
        .await
        .map_err(|e| ApiError::Database(format!("Failed to acquire connection: {}", e)))
}
