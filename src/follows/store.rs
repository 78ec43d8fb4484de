use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    accounts,
    appresult::{AppError, AppResult},
    db,
};

/// Creates the directed edge. Following twice is a no-op success; the
/// unique pair constraint holds either way, so two racing calls can both
/// report success without ever producing a second edge.
pub async fn follow(pool: &SqlitePool, follower_id: Uuid, followee_id: Uuid) -> AppResult<()> {
    if follower_id == followee_id {
        return Err(AppError::InvalidOperation("cannot follow yourself".to_owned()));
    }

    let mut tx = pool.begin().await?;
    for id in [follower_id, followee_id] {
        if !accounts::store::exists(&mut *tx, id).await? {
            return Err(AppError::NotFound("account"));
        }
    }

    let res = sqlx::query("INSERT OR IGNORE INTO follows (follower_id,followee_id,created_at) VALUES (?,?,?)")
        .bind(follower_id.to_string())
        .bind(followee_id.to_string())
        .bind(db::unix_now())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if res.rows_affected() > 0 {
        tracing::debug!(follower = %follower_id, followee = %followee_id, "edge created");
    }
    Ok(())
}

/// Absence of the edge is not an error.
pub async fn unfollow(pool: &SqlitePool, follower_id: Uuid, followee_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM follows WHERE follower_id=? AND followee_id=?")
        .bind(follower_id.to_string())
        .bind(followee_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn followees(pool: &SqlitePool, account_id: Uuid) -> AppResult<Vec<Uuid>> {
    edge_endpoints(
        pool,
        "SELECT followee_id FROM follows WHERE follower_id=? ORDER BY followee_id",
        account_id,
    )
    .await
}

pub async fn followers(pool: &SqlitePool, account_id: Uuid) -> AppResult<Vec<Uuid>> {
    edge_endpoints(
        pool,
        "SELECT follower_id FROM follows WHERE followee_id=? ORDER BY follower_id",
        account_id,
    )
    .await
}

async fn edge_endpoints(pool: &SqlitePool, sql: &str, account_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows: Vec<(String,)> = sqlx::query_as(sql)
        .bind(account_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(|(id,)| Ok(Uuid::parse_str(&id)?)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn account(pool: &SqlitePool, handle: &str) -> Uuid {
        accounts::store::create_account(pool, handle, &format!("{handle}@example.com"), handle, "", "")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn follow_twice_keeps_one_edge() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;
        let ben = account(&pool, "ben").await;

        follow(&pool, ana, ben).await.unwrap();
        follow(&pool, ana, ben).await.unwrap();

        assert_eq!(followees(&pool, ana).await.unwrap(), vec![ben]);
        assert_eq!(followers(&pool, ben).await.unwrap(), vec![ana]);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;

        let err = follow(&pool, ana, ana).await;
        assert!(matches!(err, Err(AppError::InvalidOperation(_))));
        assert!(followees(&pool, ana).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follow_unknown_account_is_not_found() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;
        let ghost = Uuid::now_v7();

        assert!(matches!(follow(&pool, ana, ghost).await, Err(AppError::NotFound(_))));
        assert!(matches!(follow(&pool, ghost, ana).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn unfollow_removes_the_edge() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;
        let ben = account(&pool, "ben").await;

        follow(&pool, ana, ben).await.unwrap();
        unfollow(&pool, ana, ben).await.unwrap();

        assert!(followees(&pool, ana).await.unwrap().is_empty());
        assert!(followers(&pool, ben).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfollow_missing_edge_is_a_noop() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;
        let ben = account(&pool, "ben").await;

        unfollow(&pool, ana, ben).await.unwrap();
    }

    #[tokio::test]
    async fn edges_are_directed() {
        let pool = db::test_pool().await;
        let ana = account(&pool, "ana").await;
        let ben = account(&pool, "ben").await;

        follow(&pool, ana, ben).await.unwrap();

        assert!(followees(&pool, ben).await.unwrap().is_empty());
        assert_eq!(followers(&pool, ben).await.unwrap(), vec![ana]);
    }
}
