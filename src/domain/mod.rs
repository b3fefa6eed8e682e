// Domain layer - business rules with no HTTP concerns.
// Pure accounting and geometry live beside the workflows that load data
// for them.

pub mod attendee;
pub mod geo;
pub mod ledger;
pub mod registration;
pub mod summary;

use crate::db::DatabaseError;
use crate::mail::MailError;
use crate::models::forms::FormErrors;
use crate::models::money::MoneyError;

// Domain error type - no HTTP concerns
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for DomainError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(msg) => DomainError::NotFound(msg),
            DatabaseError::IntegrityError(msg) => DomainError::Conflict(msg),
            DatabaseError::Unauthorized(msg) => DomainError::Unauthorized(msg),
            other => DomainError::Database(other.to_string()),
        }
    }
}

impl From<FormErrors> for DomainError {
    fn from(e: FormErrors) -> Self {
        DomainError::Validation(e.to_string())
    }
}

impl From<MoneyError> for DomainError {
    fn from(e: MoneyError) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<MailError> for DomainError {
    fn from(e: MailError) -> Self {
        DomainError::Internal(e.to_string())
    }
}

pub use attendee::{attendee_page, buy_item};
pub use geo::{bounds, BoundingBox};
pub use ledger::{balance, BalanceReport, Ledger, LineItem};
pub use registration::register;
pub use summary::build_summary;
