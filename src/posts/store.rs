use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    accounts,
    appresult::{AppError, AppResult},
    db,
};

#[derive(Debug, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub account_id: Uuid,
    pub body: String,
    pub created_at: i64,
    pub images: Vec<Image>,
}

/// Image record only; the bytes live behind `storage_ref` in whatever
/// blob store the collaborator points it at.
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    pub storage_ref: String,
    pub position: i64,
}

/// Post and image rows land in one transaction; a concurrent reader sees
/// the whole post or nothing.
pub async fn create_post(
    pool: &SqlitePool,
    account_id: Uuid,
    body: &str,
    images: &[String],
) -> AppResult<Uuid> {
    if body.trim().is_empty() && images.is_empty() {
        return Err(AppError::InvalidOperation(
            "post needs a body or at least one image".to_owned(),
        ));
    }

    let id = Uuid::now_v7();
    let mut tx = pool.begin().await?;
    if !accounts::store::exists(&mut *tx, account_id).await? {
        return Err(AppError::NotFound("account"));
    }

    sqlx::query("INSERT INTO posts (id,account_id,body,created_at) VALUES (?,?,?,?)")
        .bind(id.to_string())
        .bind(account_id.to_string())
        .bind(body)
        .bind(db::unix_now())
        .execute(&mut *tx)
        .await?;
    for (position, storage_ref) in images.iter().enumerate() {
        sqlx::query("INSERT INTO images (post_id,position,storage_ref) VALUES (?,?,?)")
            .bind(id.to_string())
            .bind(position as i64)
            .bind(storage_ref)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::debug!(post = %id, author = %account_id, "post created");
    Ok(id)
}

/// Owner lookup for the authorization collaborator's benefit.
pub async fn post_owner(pool: &SqlitePool, post_id: Uuid) -> AppResult<Uuid> {
    let row: Option<(String,)> = sqlx::query_as("SELECT account_id FROM posts WHERE id=?")
        .bind(post_id.to_string())
        .fetch_optional(pool)
        .await?;

    let (owner,) = row.ok_or(AppError::NotFound("post"))?;
    Ok(Uuid::parse_str(&owner)?)
}

/// An image never outlives its post: both go in the same transaction.
pub async fn delete_post(pool: &SqlitePool, post_id: Uuid) -> AppResult<()> {
    let id = post_id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM images WHERE post_id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    let res = sqlx::query("DELETE FROM posts WHERE id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("post"));
    }
    tx.commit().await?;
    Ok(())
}

pub async fn posts_by_account(pool: &SqlitePool, account_id: Uuid) -> AppResult<Vec<Post>> {
    posts_by_accounts(pool, std::slice::from_ref(&account_id)).await
}

/// Bulk fetch for the feed: newest first, ties broken by ascending post
/// id so the order is reproducible.
pub async fn posts_by_accounts(pool: &SqlitePool, account_ids: &[Uuid]) -> AppResult<Vec<Post>> {
    if account_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; account_ids.len()].join(",");
    let sql = format!(
        "SELECT id,account_id,body,created_at FROM posts WHERE account_id IN ({placeholders}) ORDER BY created_at DESC, id ASC"
    );
    let mut query = sqlx::query_as::<_, (String, String, String, i64)>(&sql);
    for id in account_ids {
        query = query.bind(id.to_string());
    }

    let mut posts = query
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(id, account_id, body, created_at)| {
            Ok(Post {
                id: Uuid::parse_str(&id)?,
                account_id: Uuid::parse_str(&account_id)?,
                body,
                created_at,
                images: Vec::new(),
            })
        })
        .collect::<AppResult<Vec<Post>>>()?;

    attach_images(pool, &mut posts).await?;
    Ok(posts)
}

async fn attach_images(pool: &SqlitePool, posts: &mut [Post]) -> AppResult<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; posts.len()].join(",");
    let sql = format!(
        "SELECT post_id,position,storage_ref FROM images WHERE post_id IN ({placeholders}) ORDER BY post_id, position"
    );
    let mut query = sqlx::query_as::<_, (String, i64, String)>(&sql);
    for post in posts.iter() {
        query = query.bind(post.id.to_string());
    }

    let mut by_post: HashMap<Uuid, Vec<Image>> = HashMap::new();
    for (post_id, position, storage_ref) in query.fetch_all(pool).await? {
        by_post
            .entry(Uuid::parse_str(&post_id)?)
            .or_default()
            .push(Image { storage_ref, position });
    }
    for post in posts {
        if let Some(images) = by_post.remove(&post.id) {
            post.images = images;
        }
    }
    Ok(())
}
