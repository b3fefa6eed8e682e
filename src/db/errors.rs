use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Query execution error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Integrity constraint violation: {0}")]
    IntegrityError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl DatabaseError {
    /// Turn a raw sqlx error into the closest variant, so that unique and
    /// foreign-key violations surface as integrity errors.
    pub fn classify(err: sqlx::Error) -> Self {
        if let Some(db_error) = err.as_database_error() {
            // PostgreSQL integrity constraint violation codes
            if matches!(
                db_error.code().as_deref(),
                Some("23505") | // unique_violation
                Some("23503") | // foreign_key_violation
                Some("23502")   // not_null_violation
            ) {
                return Self::IntegrityError(db_error.message().to_string());
            }
        }
        Self::QueryError(err)
    }

    pub fn is_integrity_error(&self) -> bool {
        matches!(self, Self::IntegrityError(_))
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_non_database_errors() {
        let err = DatabaseError::classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::QueryError(sqlx::Error::RowNotFound)));
        assert!(!err.is_integrity_error());
    }

    #[test]
    fn test_display() {
        let err = DatabaseError::NotFound("person 3".to_string());
        assert_eq!(err.to_string(), "Record not found: person 3");
    }
}
