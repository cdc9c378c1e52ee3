//! Database access for the feedback tool
//!
//! Single local SQLite database created on first run. The schema is
//! applied idempotently at startup; orgchart refreshes only ever touch
//! the `persons` table, never stored feedback.

pub mod models;
pub mod settings;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the database and apply the schema.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables if they don't exist.
///
/// Tenet selections are stored as JSON arrays of tenet ids in TEXT
/// columns; counts are validated at the submission boundary, not here.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            user_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            job_title TEXT,
            location TEXT,
            email TEXT,
            manager_uid TEXT REFERENCES persons(user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_user_id TEXT NOT NULL,
            to_user_id TEXT NOT NULL,
            strengths TEXT NOT NULL DEFAULT '[]',
            improvements TEXT NOT NULL DEFAULT '[]',
            strengths_text TEXT NOT NULL DEFAULT '',
            improvements_text TEXT NOT NULL DEFAULT '',
            UNIQUE(from_user_id, to_user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manager_feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            manager_uid TEXT NOT NULL,
            team_member_uid TEXT NOT NULL,
            selected_strengths TEXT NOT NULL DEFAULT '[]',
            selected_improvements TEXT NOT NULL DEFAULT '[]',
            feedback_text TEXT NOT NULL DEFAULT '',
            UNIQUE(manager_uid, team_member_uid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // content_hash is the dedup key: re-importing the same spreadsheet
    // must not duplicate rows already present with an identical hash.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workday_feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            about TEXT NOT NULL,
            from_name TEXT NOT NULL,
            question TEXT,
            feedback TEXT,
            asked_by TEXT,
            request_type TEXT,
            date TEXT,
            is_structured INTEGER NOT NULL DEFAULT 0,
            strengths TEXT,
            improvements TEXT,
            strengths_text TEXT,
            improvements_text TEXT,
            content_hash TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (persons, feedback, manager_feedback, workday_feedback, settings)"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let pool = memory_pool().await;
        init_tables(&pool).await.unwrap();
        init_tables(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn workday_content_hash_is_unique() {
        let pool = memory_pool().await;
        init_tables(&pool).await.unwrap();

        let insert = "INSERT INTO workday_feedback (about, from_name, content_hash) VALUES (?, ?, ?)";
        sqlx::query(insert)
            .bind("Robin Rollback")
            .bind("Larry Latency")
            .bind("abc123")
            .execute(&pool)
            .await
            .unwrap();

        let dup = sqlx::query(insert)
            .bind("Robin Rollback")
            .bind("Larry Latency")
            .bind("abc123")
            .execute(&pool)
            .await;
        assert!(dup.is_err());
    }
}
