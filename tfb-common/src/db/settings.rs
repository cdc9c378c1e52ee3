//! Settings table accessors
//!
//! Key/value persistence. Besides tool preferences this holds the
//! single-user identity (current individual and manager): the tool is
//! local and single-user, so identity lives in the database instead of
//! browser sessions.

use crate::Result;
use sqlx::SqlitePool;

/// Settings key: user currently giving peer feedback
pub const KEY_CURRENT_USER: &str = "current_user_id";
/// Settings key: manager selected from the orgchart
pub const KEY_MANAGER_UID: &str = "manager_uid";
/// Settings key: manager known only by name (Workday-only workflow)
pub const KEY_MANAGER_NAME: &str = "manager_name";

pub async fn get_setting(db: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(value.map(|(v,)| v))
}

pub async fn set_setting(db: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn clear_setting(db: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn set_get_clear_round_trip() {
        let pool = test_pool().await;

        assert_eq!(get_setting(&pool, KEY_CURRENT_USER).await.unwrap(), None);

        set_setting(&pool, KEY_CURRENT_USER, "emp001").await.unwrap();
        assert_eq!(
            get_setting(&pool, KEY_CURRENT_USER).await.unwrap(),
            Some("emp001".to_string())
        );

        // Overwrite in place
        set_setting(&pool, KEY_CURRENT_USER, "emp002").await.unwrap();
        assert_eq!(
            get_setting(&pool, KEY_CURRENT_USER).await.unwrap(),
            Some("emp002".to_string())
        );

        clear_setting(&pool, KEY_CURRENT_USER).await.unwrap();
        assert_eq!(get_setting(&pool, KEY_CURRENT_USER).await.unwrap(), None);
    }
}
