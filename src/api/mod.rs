pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{create_app, AppState};
