pub mod store;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppResult, AppState, Caller};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/me", patch(update_me).delete(delete_me))
        .route("/{handle}", get(profile))
}

#[derive(Deserialize)]
pub(crate) struct RegisterRequest {
    handle: String,
    email: String,
    display_name: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    avatar: String,
}

#[derive(Serialize)]
pub(crate) struct RegisteredAccount {
    id: Uuid,
    handle: String,
}

#[debug_handler]
async fn register(
    State(db_pool): State<SqlitePool>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<RegisteredAccount>> {
    let id = store::create_account(
        &db_pool,
        &req.handle,
        &req.email,
        &req.display_name,
        &req.bio,
        &req.avatar,
    )
    .await?;

    Ok(Json(RegisteredAccount { id, handle: req.handle }))
}

#[derive(Deserialize)]
pub(crate) struct UpdateProfileRequest {
    handle: String,
    email: String,
    display_name: String,
    bio: String,
    avatar: String,
}

#[debug_handler]
async fn update_me(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<()> {
    store::update_profile(
        &db_pool,
        caller_id,
        &req.handle,
        &req.email,
        &req.display_name,
        &req.bio,
        &req.avatar,
    )
    .await
}

#[debug_handler]
async fn delete_me(
    State(db_pool): State<SqlitePool>,
    Caller(caller_id): Caller,
) -> AppResult<()> {
    store::delete_account(&db_pool, caller_id).await
}

#[debug_handler]
async fn profile(
    State(db_pool): State<SqlitePool>,
    Path(handle): Path<String>,
) -> AppResult<Json<store::Profile>> {
    Ok(Json(store::profile_by_handle(&db_pool, &handle).await?))
}
