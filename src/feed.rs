use std::collections::HashMap;

use anyhow::anyhow;
use axum::{Json, Router, debug_handler, extract::State, routing::get};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState, Caller,
    accounts::{self, store::AccountSummary},
    appresult::{AppError, AppResult},
    follows,
    posts::{self, store::Post},
};

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: AccountSummary,
    pub body: String,
    pub created_at: i64,
    pub images: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feed))
}

#[debug_handler]
async fn feed(
    State(db_pool): State<SqlitePool>,
    Caller(viewer): Caller,
) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(get_feed(&db_pool, viewer).await?))
}

/// Follow edges out, followee posts back, merged newest-first. The store
/// pre-sorts on creation time with the post id as tie-break, so repeated
/// reads over unchanged data come back in the same order.
pub async fn get_feed(pool: &SqlitePool, viewer: Uuid) -> AppResult<Vec<PostView>> {
    if !accounts::store::exists(pool, viewer).await? {
        // identity resolution is the auth collaborator's job; an unknown
        // viewer here means that contract was broken
        return Err(AppError::NotFound("account"));
    }

    let followees = follows::store::followees(pool, viewer).await?;
    if followees.is_empty() {
        return Ok(Vec::new());
    }

    let posts = posts::store::posts_by_accounts(pool, &followees).await?;
    views(pool, posts).await
}

pub(crate) async fn views(pool: &SqlitePool, posts: Vec<Post>) -> AppResult<Vec<PostView>> {
    let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.account_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, AccountSummary> = accounts::store::summaries_by_ids(pool, &author_ids)
        .await?
        .into_iter()
        .collect();

    posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.account_id)
                .cloned()
                .ok_or_else(|| anyhow!("post {} has no author row", post.id))?;
            Ok(PostView {
                id: post.id,
                author,
                body: post.body,
                created_at: post.created_at,
                images: post.images.into_iter().map(|i| i.storage_ref).collect(),
            })
        })
        .collect()
}
