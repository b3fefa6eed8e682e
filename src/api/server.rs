use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::handlers::{admin, attendees, payments, poi, products, public, purchases, registration, todos};
use crate::auth::token::TokenKey;
use crate::config::Settings;
use crate::db;
use crate::mail::{mailer_for, Mailer};

/// Shared, cheaply cloned state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    pub tokens: TokenKey,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Settings, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenKey::new(&settings.secret_key);
        Self {
            pool,
            settings: Arc::new(settings),
            tokens,
            mailer,
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(false)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn,tower=warn")),
        )
        .init();
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(public::index_handler))
        .route("/map/", get(public::map_handler))
        .route(
            "/register",
            get(registration::options_handler).post(registration::register_handler),
        )
        .route("/attendee/{id}", get(public::attendee_handler))
        .route("/buy", get(public::buy_handler))
        .route("/health", get(health_check))
        .route("/org/", get(admin::summary_handler))
        .route(
            "/org/attendees/",
            get(attendees::list_handler).post(attendees::create_handler),
        )
        .route("/org/attendees/attendees.csv", get(attendees::csv_handler))
        .route("/org/attendees/email", get(attendees::email_list_handler))
        .route("/org/attendees/mail-all", post(attendees::mail_all_handler))
        .route(
            "/org/attendees/{id}",
            put(attendees::update_handler).delete(attendees::delete_handler),
        )
        .route("/org/poi/", get(poi::list_handler).post(poi::create_handler))
        .route("/org/poi/{id}", put(poi::update_handler).delete(poi::delete_handler))
        .route(
            "/org/products/",
            get(products::list_handler).post(products::create_handler),
        )
        .route(
            "/org/products/{id}",
            put(products::update_handler).delete(products::delete_handler),
        )
        .route(
            "/org/payments/",
            get(payments::list_handler).post(payments::create_handler),
        )
        .route(
            "/org/payments/{id}",
            put(payments::update_handler).delete(payments::delete_handler),
        )
        .route(
            "/org/purchases/",
            get(purchases::list_handler).post(purchases::create_handler),
        )
        .route(
            "/org/purchases/{id}",
            put(purchases::update_handler).delete(purchases::delete_handler),
        )
        .route("/org/todo/", get(todos::list_handler).post(todos::create_handler))
        .route("/org/todo/{id}", put(todos::update_handler).delete(todos::delete_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

/// Connect to the database and assemble state from settings.
pub async fn build_state(settings: Settings) -> anyhow::Result<AppState> {
    let pool = db::create_pool(&settings.database_url).await?;
    db::run_migrations(&pool).await?;
    db::seed(&pool).await?;

    let mailer = mailer_for(&settings);
    Ok(AppState::new(pool, settings, mailer))
}

pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    init_tracing();

    info!(site = %settings.site_title, "Starting registration server");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down gracefully...");
    };

    let port = settings.port;
    let state = build_state(settings).await?;
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
