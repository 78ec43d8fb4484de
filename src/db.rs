use std::str::FromStr;

use sqlx::{SqlitePool, sqlite::{SqliteConnectOptions, SqlitePoolOptions}};

// No ON DELETE CASCADE: account and post deletion issue the child
// deletes themselves, inside the owning transaction.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id           TEXT PRIMARY KEY,
    handle       TEXT NOT NULL UNIQUE,
    email        TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    bio          TEXT NOT NULL DEFAULT '',
    avatar       TEXT NOT NULL DEFAULT '',
    activated    INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL REFERENCES accounts(id),
    followee_id TEXT NOT NULL REFERENCES accounts(id),
    created_at  INTEGER NOT NULL,
    PRIMARY KEY (follower_id, followee_id),
    CHECK (follower_id <> followee_id)
);

CREATE INDEX IF NOT EXISTS follows_by_followee ON follows (followee_id);

CREATE TABLE IF NOT EXISTS posts (
    id         TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    body       TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS posts_by_account ON posts (account_id, created_at);

CREATE TABLE IF NOT EXISTS images (
    post_id     TEXT NOT NULL REFERENCES posts(id),
    position    INTEGER NOT NULL,
    storage_ref TEXT NOT NULL,
    PRIMARY KEY (post_id, position)
);
"#;

pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

pub(crate) fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// An in-memory database lives and dies with its connection, so the test
// pool is pinned to a single one.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    apply_schema(&pool).await.unwrap();
    pool
}
