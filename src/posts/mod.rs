pub mod store;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppError, AppResult, AppState, Caller, accounts,
    feed::{self, PostView},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", delete(remove))
        .route("/by/{handle}", get(by_account))
}

#[derive(Deserialize)]
pub(crate) struct CreatePostRequest {
    body: String,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Serialize)]
pub(crate) struct CreatedPost {
    id: Uuid,
}

#[debug_handler]
async fn create(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Json<CreatedPost>> {
    let id = store::create_post(&db_pool, caller_id, &req.body, &req.images).await?;
    Ok(Json(CreatedPost { id }))
}

#[debug_handler]
async fn remove(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
    Path(post_id): Path<Uuid>,
) -> AppResult<()> {
    // ownership check lives at this layer; a foreign post reads as absent
    if store::post_owner(&db_pool, post_id).await? != caller_id {
        return Err(AppError::NotFound("post"));
    }
    store::delete_post(&db_pool, post_id).await
}

#[debug_handler]
async fn by_account(
    State(db_pool): State<SqlitePool>,
    Path(handle): Path<String>,
) -> AppResult<Json<Vec<PostView>>> {
    let account_id = accounts::store::find_id_by_handle(&db_pool, &handle).await?;
    let posts = store::posts_by_account(&db_pool, account_id).await?;
    Ok(Json(feed::views(&db_pool, posts).await?))
}
