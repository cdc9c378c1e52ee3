//! Orgchart CSV import
//!
//! Refreshes the person directory from an orgchart export. Rows upsert
//! by user id; a refresh never deletes people and never touches stored
//! feedback.

use serde::Serialize;
use sqlx::SqlitePool;
use tfb_common::db::settings;
use tfb_common::{Error, Result};

/// Required CSV columns (optional: `Location`)
const REQUIRED_COLUMNS: &[&str] = &["Name", "User ID", "Job Title", "Email", "Manager UID"];

/// Outcome of an orgchart import
#[derive(Debug, Default, Serialize)]
pub struct OrgchartReport {
    pub new_count: u64,
    pub updated_count: u64,
    pub reset: bool,
}

/// Import an orgchart CSV.
///
/// With `reset` set, all people and feedback are cleared first and the
/// stored user/manager identities are dropped (they may no longer
/// exist).
pub async fn import_orgchart_csv(db: &SqlitePool, bytes: &[u8], reset: bool) -> Result<OrgchartReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("Empty or invalid CSV file: {}", e)))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Invalid CSV format. Missing columns: {}",
            missing.join(", ")
        )));
    }

    let column = |name: &str| headers.iter().position(|h| h == name);
    let name_col = column("Name").expect("validated above");
    let user_id_col = column("User ID").expect("validated above");
    let title_col = column("Job Title").expect("validated above");
    let email_col = column("Email").expect("validated above");
    let manager_col = column("Manager UID").expect("validated above");
    let location_col = column("Location");

    let mut report = OrgchartReport {
        reset,
        ..Default::default()
    };

    if reset {
        sqlx::query("DELETE FROM manager_feedback").execute(db).await?;
        sqlx::query("DELETE FROM feedback").execute(db).await?;
        sqlx::query("DELETE FROM persons").execute(db).await?;
        settings::clear_setting(db, settings::KEY_CURRENT_USER).await?;
        settings::clear_setting(db, settings::KEY_MANAGER_UID).await?;
        settings::clear_setting(db, settings::KEY_MANAGER_NAME).await?;
    }

    for record in reader.records() {
        let record = record.map_err(|e| Error::InvalidInput(format!("Malformed CSV row: {}", e)))?;

        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        let user_id = field(user_id_col);
        if user_id.is_empty() {
            continue;
        }
        let name = field(name_col);
        let job_title = field(title_col);
        let email = field(email_col);
        let location = location_col.map(field).filter(|s| !s.is_empty());
        let manager_uid = {
            let raw = field(manager_col);
            if raw.is_empty() { None } else { Some(raw) }
        };

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM persons WHERE user_id = ?")
                .bind(&user_id)
                .fetch_optional(db)
                .await?;

        if existing.is_some() {
            sqlx::query(
                "UPDATE persons SET name = ?, job_title = ?, email = ?, location = ?, manager_uid = ? \
                 WHERE user_id = ?",
            )
            .bind(&name)
            .bind(&job_title)
            .bind(&email)
            .bind(&location)
            .bind(&manager_uid)
            .bind(&user_id)
            .execute(db)
            .await?;
            report.updated_count += 1;
        } else {
            sqlx::query(
                "INSERT INTO persons (user_id, name, job_title, email, location, manager_uid) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&user_id)
            .bind(&name)
            .bind(&job_title)
            .bind(&email)
            .bind(&location)
            .bind(&manager_uid)
            .execute(db)
            .await?;
            report.new_count += 1;
        }
    }

    Ok(report)
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
        tfb_common::db::init_tables(&pool).await.unwrap();
        pool
    }

    const CSV: &str = "Name,User ID,Job Title,Email,Manager UID,Location\n\
                       Mo Mutex,mgr001,Engineering Manager,mo@example.com,,Berlin\n\
                       Larry Latency,emp001,Engineer,larry@example.com,mgr001,Berlin\n";

    #[tokio::test]
    async fn imports_and_upserts_people() {
        let pool = test_pool().await;

        let report = import_orgchart_csv(&pool, CSV.as_bytes(), false).await.unwrap();
        assert_eq!(report.new_count, 2);
        assert_eq!(report.updated_count, 0);

        // Re-import updates in place
        let updated = "Name,User ID,Job Title,Email,Manager UID\n\
                       Larry Latency,emp001,Senior Engineer,larry@example.com,mgr001\n";
        let report = import_orgchart_csv(&pool, updated.as_bytes(), false).await.unwrap();
        assert_eq!(report.new_count, 0);
        assert_eq!(report.updated_count, 1);

        let (title,): (String,) =
            sqlx::query_as("SELECT job_title FROM persons WHERE user_id = 'emp001'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(title, "Senior Engineer");
    }

    #[tokio::test]
    async fn missing_location_column_stores_null() {
        let pool = test_pool().await;

        let without_location = "Name,User ID,Job Title,Email,Manager UID\n\
                                Larry Latency,emp001,Engineer,larry@example.com,mgr001\n";
        import_orgchart_csv(&pool, without_location.as_bytes(), false)
            .await
            .unwrap();

        let (location,): (Option<String>,) =
            sqlx::query_as("SELECT location FROM persons WHERE user_id = 'emp001'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(location, None);
    }

    #[tokio::test]
    async fn refresh_keeps_existing_feedback() {
        let pool = test_pool().await;
        import_orgchart_csv(&pool, CSV.as_bytes(), false).await.unwrap();

        sqlx::query(
            "INSERT INTO feedback (from_user_id, to_user_id, strengths, improvements) \
             VALUES ('emp001', 'mgr001', '[\"ownership\"]', '[\"quality\"]')",
        )
        .execute(&pool)
        .await
        .unwrap();

        import_orgchart_csv(&pool, CSV.as_bytes(), false).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn reset_clears_people_and_feedback() {
        let pool = test_pool().await;
        import_orgchart_csv(&pool, CSV.as_bytes(), false).await.unwrap();
        sqlx::query(
            "INSERT INTO feedback (from_user_id, to_user_id) VALUES ('emp001', 'mgr001')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let report = import_orgchart_csv(&pool, CSV.as_bytes(), true).await.unwrap();
        assert!(report.reset);
        assert_eq!(report.new_count, 2);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn missing_columns_are_rejected() {
        let pool = test_pool().await;
        let bad = "Name,User ID\nLarry Latency,emp001\n";
        let err = import_orgchart_csv(&pool, bad.as_bytes(), false).await.unwrap_err();
        assert!(err.to_string().contains("Missing columns"));
    }
}
