pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod mail;
pub mod models;

// Re-export commonly used types
pub use auth::{attendee_link, TokenKey};

pub use config::Settings;

pub use db::{create_pool, run_migrations, DatabaseError};

pub use domain::{bounds, BalanceReport, BoundingBox, DomainError, Ledger, LineItem};

pub use models::{Currency, Money};
