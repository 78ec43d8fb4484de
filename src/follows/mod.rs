pub mod store;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::{get, post},
};
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState, Caller,
    accounts::{self, store::AccountSummary},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/followers", get(followers))
        .route("/followees", get(followees))
        .route("/{handle}", post(follow).delete(unfollow))
}

#[debug_handler]
async fn follow(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
    Path(handle): Path<String>,
) -> AppResult<()> {
    let target = accounts::store::find_id_by_handle(&db_pool, &handle).await?;
    store::follow(&db_pool, caller_id, target).await
}

#[debug_handler]
async fn unfollow(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
    Path(handle): Path<String>,
) -> AppResult<()> {
    let target = accounts::store::find_id_by_handle(&db_pool, &handle).await?;
    store::unfollow(&db_pool, caller_id, target).await
}

#[debug_handler]
async fn followers(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
) -> AppResult<Json<Vec<AccountSummary>>> {
    let ids = store::followers(&db_pool, caller_id).await?;
    let summaries = accounts::store::summaries_by_ids(&db_pool, &ids).await?;
    Ok(Json(summaries.into_iter().map(|(_, s)| s).collect()))
}

#[debug_handler]
async fn followees(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
) -> AppResult<Json<Vec<AccountSummary>>> {
    let ids = store::followees(&db_pool, caller_id).await?;
    let summaries = accounts::store::summaries_by_ids(&db_pool, &ids).await?;
    Ok(Json(summaries.into_iter().map(|(_, s)| s).collect()))
}
