use axum::{http::StatusCode, response::{IntoResponse, Response}};

pub type AppResult<T> = Result<T, AppError>;

/// Outcomes the stores report to callers. Anything else (a store failure
/// mid-transaction, a corrupt row) is `Internal` and surfaces as a 500
/// with the detail logged, never returned.
#[derive(Debug)]
pub enum AppError {
    NotFound(&'static str),
    InvalidOperation(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
            }
            AppError::InvalidOperation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response()
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            AppError::Internal(err) => {
                tracing::error!("{err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned()).into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

pub(crate) fn on_unique_conflict(err: sqlx::Error, msg: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(msg.to_owned()),
        _ => err.into(),
    }
}
