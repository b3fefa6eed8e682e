// Create or rebuild the schema and seed the registration product.
//
//   init-db           apply pending migrations
//   init-db --drop    drop every table first

use devsummit::config::Settings;
use devsummit::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let drop_first = std::env::args().skip(1).any(|arg| arg == "--drop");
    let settings = Settings::from_env()?;
    let pool = db::create_pool(&settings.database_url).await?;

    if drop_first {
        db::drop_all(&pool).await?;
    }

    db::run_migrations(&pool).await?;
    db::seed(&pool).await?;

    tracing::info!("Database ready");
    Ok(())
}
