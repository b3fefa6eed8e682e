use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::db::errors::{DatabaseError, Result};

/// Name of the product every registrant buys.
pub const REGISTRATION_PRODUCT: &str = "Registration";

/// Create the connection pool and check that the database answers.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(60))
        .test_before_acquire(true)
        .connect(database_url)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("Failed to create pool: {}", e)))?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Pool that only connects when first used.
pub fn create_lazy_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(database_url)
        .map_err(|e| DatabaseError::ConnectionError(format!("Failed to create pool: {}", e)))
}

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Applying database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Make sure the registration product exists. It starts out free; the
/// organizers set its price before opening registration.
pub async fn seed(pool: &PgPool) -> Result<()> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO product (name, description, cost)
        VALUES ($1, 'Normal registration', 0)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(REGISTRATION_PRODUCT)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?
    .rows_affected();

    if inserted > 0 {
        info!("Created '{}' product", REGISTRATION_PRODUCT);
    }
    Ok(())
}

/// Drop every table so the schema can be rebuilt from scratch.
pub async fn drop_all(pool: &PgPool) -> Result<()> {
    for table in ["todo", "payment", "purchase", "product", "person", "poi", "_sqlx_migrations"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(pool)
            .await
            .map_err(DatabaseError::QueryError)?;
    }
    info!("Dropped all tables");
    Ok(())
}
