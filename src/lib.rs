pub mod accounts;
pub mod appresult;
pub mod caller;
pub mod db;
pub mod feed;
pub mod follows;
pub mod posts;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};
pub use caller::Caller;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}
