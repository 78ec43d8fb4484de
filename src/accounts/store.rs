use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::appresult::{AppError, AppResult, on_unique_conflict};

const UNIQUE_TAKEN: &str = "handle or email already in use";

/// Read projection handed to the graph listings and the feed.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub handle: String,
    pub display_name: String,
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidOperation(format!("{field} must not be blank")));
    }
    Ok(())
}

pub async fn create_account(
    pool: &SqlitePool,
    handle: &str,
    email: &str,
    display_name: &str,
    bio: &str,
    avatar: &str,
) -> AppResult<Uuid> {
    require("handle", handle)?;
    require("email", email)?;
    require("display_name", display_name)?;

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO accounts (id,handle,email,display_name,bio,avatar,activated) VALUES (?,?,?,?,?,?,1)")
        .bind(id.to_string())
        .bind(handle)
        .bind(email)
        .bind(display_name)
        .bind(bio)
        .bind(avatar)
        .execute(pool)
        .await
        .map_err(|e| on_unique_conflict(e, UNIQUE_TAKEN))?;

    tracing::info!(%handle, "account registered");
    Ok(id)
}

/// Full replacement of the mutable profile attributes.
pub async fn update_profile(
    pool: &SqlitePool,
    id: Uuid,
    handle: &str,
    email: &str,
    display_name: &str,
    bio: &str,
    avatar: &str,
) -> AppResult<()> {
    require("handle", handle)?;
    require("email", email)?;
    require("display_name", display_name)?;

    let res = sqlx::query("UPDATE accounts SET handle=?,email=?,display_name=?,bio=?,avatar=? WHERE id=?")
        .bind(handle)
        .bind(email)
        .bind(display_name)
        .bind(bio)
        .bind(avatar)
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| on_unique_conflict(e, UNIQUE_TAKEN))?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("account"));
    }
    Ok(())
}

/// Deleting an account takes its posts, their images, and every follow
/// edge touching it down in the same unit of work. A reader sees either
/// all of it or none of it.
pub async fn delete_account(pool: &SqlitePool, id: Uuid) -> AppResult<()> {
    let id = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM images WHERE post_id IN (SELECT id FROM posts WHERE account_id=?)")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM posts WHERE account_id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM follows WHERE follower_id=? OR followee_id=?")
        .bind(&id)
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    let res = sqlx::query("DELETE FROM accounts WHERE id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("account"));
    }
    tx.commit().await?;

    tracing::info!(account = %id, "account deleted");
    Ok(())
}

pub async fn exists<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
    db: E,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("SELECT 1 FROM accounts WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?
        .is_some())
}

pub async fn find_id_by_handle(pool: &SqlitePool, handle: &str) -> AppResult<Uuid> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM accounts WHERE handle=?")
        .bind(handle)
        .fetch_optional(pool)
        .await?;
    let (id,) = row.ok_or(AppError::NotFound("account"))?;
    Ok(Uuid::parse_str(&id)?)
}

pub async fn profile_by_handle(pool: &SqlitePool, handle: &str) -> AppResult<Profile> {
    let row: Option<(String, String, String, String)> =
        sqlx::query_as("SELECT handle,display_name,bio,avatar FROM accounts WHERE handle=?")
            .bind(handle)
            .fetch_optional(pool)
            .await?;

    let (handle, display_name, bio, avatar) = row.ok_or(AppError::NotFound("account"))?;
    Ok(Profile { handle, display_name, bio, avatar })
}

pub async fn summaries_by_ids(
    pool: &SqlitePool,
    ids: &[Uuid],
) -> AppResult<Vec<(Uuid, AccountSummary)>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!(
        "SELECT id,handle,display_name,avatar FROM accounts WHERE id IN ({placeholders}) ORDER BY handle"
    );
    let mut query = sqlx::query_as::<_, (String, String, String, String)>(&sql);
    for id in ids {
        query = query.bind(id.to_string());
    }

    query
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(id, handle, display_name, avatar)| {
            Ok((Uuid::parse_str(&id)?, AccountSummary { handle, display_name, avatar }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, follows, posts};

    async fn account(pool: &SqlitePool, handle: &str) -> Uuid {
        create_account(pool, handle, &format!("{handle}@example.com"), handle, "", "")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let pool = db::test_pool().await;

        let err = create_account(&pool, "", "a@example.com", "Ana", "", "").await;
        assert!(matches!(err, Err(AppError::InvalidOperation(_))));

        let err = create_account(&pool, "ana", "  ", "Ana", "", "").await;
        assert!(matches!(err, Err(AppError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn duplicate_handle_is_a_conflict() {
        let pool = db::test_pool().await;
        account(&pool, "ana").await;

        let err = create_account(&pool, "ana", "other@example.com", "Ana", "", "").await;
        assert!(matches!(err, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let pool = db::test_pool().await;
        account(&pool, "ana").await;

        let err = create_account(&pool, "ana2", "ana@example.com", "Ana", "", "").await;
        assert!(matches!(err, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_replaces_profile_fields() {
        let pool = db::test_pool().await;
        let id = account(&pool, "ana").await;

        update_profile(&pool, id, "ana_v2", "ana@example.com", "Ana B.", "hi there", "avatars/ana.png")
            .await
            .unwrap();

        let profile = profile_by_handle(&pool, "ana_v2").await.unwrap();
        assert_eq!(profile.display_name, "Ana B.");
        assert_eq!(profile.bio, "hi there");
        assert_eq!(profile.avatar, "avatars/ana.png");
        assert!(matches!(
            profile_by_handle(&pool, "ana").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_to_taken_handle_is_a_conflict() {
        let pool = db::test_pool().await;
        account(&pool, "ana").await;
        let ben = account(&pool, "ben").await;

        let err = update_profile(&pool, ben, "ana", "ben@example.com", "Ben", "", "").await;
        assert!(matches!(err, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_missing_account_is_not_found() {
        let pool = db::test_pool().await;

        let err = update_profile(&pool, Uuid::now_v7(), "ghost", "g@example.com", "Ghost", "", "").await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_cascades_to_posts_edges_and_images() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;
        let ben = account(&pool, "ben").await;
        let cleo = account(&pool, "cleo").await;

        follows::store::follow(&pool, ana, ben).await.unwrap();
        follows::store::follow(&pool, cleo, ana).await.unwrap();
        posts::store::create_post(&pool, ana, "last post", &["img-1".to_owned()])
            .await
            .unwrap();

        delete_account(&pool, ana).await.unwrap();

        assert!(matches!(
            find_id_by_handle(&pool, "ana").await,
            Err(AppError::NotFound(_))
        ));
        assert!(follows::store::followers(&pool, ben).await.unwrap().is_empty());
        assert!(follows::store::followees(&pool, cleo).await.unwrap().is_empty());
        assert!(posts::store::posts_by_account(&pool, ana).await.unwrap().is_empty());

        let (images,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(images, 0);
    }

    #[tokio::test]
    async fn delete_missing_account_is_not_found() {
        let pool = db::test_pool().await;

        let err = delete_account(&pool, Uuid::now_v7()).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn summaries_skip_unknown_ids() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;

        let summaries = summaries_by_ids(&pool, &[ana, Uuid::now_v7()]).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].0, ana);
        assert_eq!(summaries[0].1.handle, "ana");
    }
}
