//! Peer-feedback CSV exchange
//!
//! Individuals export their feedback per manager as CSV; managers import
//! those files on their own machine. Tenet id lists are comma-joined in
//! a single cell. Import skips (from, to) pairs that already exist.

use sqlx::SqlitePool;
use tfb_common::db::models::{tenet_list_json, PeerFeedback};
use tfb_common::{Error, Result};

/// Column order of the exchange format
pub const CSV_HEADERS: &[&str] = &[
    "From User ID",
    "To User ID",
    "Strengths (Tenet IDs)",
    "Improvements (Tenet IDs)",
    "Strengths Text",
    "Improvements Text",
];

/// Render feedback rows in the exchange format.
pub fn export_feedback_csv(rows: &[PeerFeedback]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| Error::Internal(format!("CSV write failed: {}", e)))?;

    for fb in rows {
        writer
            .write_record([
                fb.from_user_id.as_str(),
                fb.to_user_id.as_str(),
                &fb.strengths().join(","),
                &fb.improvements().join(","),
                fb.strengths_text.as_str(),
                fb.improvements_text.as_str(),
            ])
            .map_err(|e| Error::Internal(format!("CSV write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("CSV write failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV encoding failed: {}", e)))
}

/// Import an exchange-format CSV; returns the number of rows inserted.
///
/// Rows whose (from, to) pair is already present are left untouched so
/// a manager can re-import a file without clobbering newer edits.
pub async fn import_feedback_csv(db: &SqlitePool, bytes: &[u8]) -> Result<u64> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("Empty or invalid CSV file: {}", e)))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::InvalidInput(format!("Missing column: {}", name)))
    };
    let from_col = column("From User ID")?;
    let to_col = column("To User ID")?;
    let strengths_col = column("Strengths (Tenet IDs)")?;
    let improvements_col = column("Improvements (Tenet IDs)")?;
    let strengths_text_col = column("Strengths Text")?;
    let improvements_text_col = column("Improvements Text")?;

    let split_ids = |raw: &str| -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    let mut inserted = 0;
    for record in reader.records() {
        let record = record.map_err(|e| Error::InvalidInput(format!("Malformed CSV row: {}", e)))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let from_user_id = field(from_col);
        let to_user_id = field(to_col);
        if from_user_id.is_empty() || to_user_id.is_empty() {
            continue;
        }

        let strengths = tenet_list_json(&split_ids(&field(strengths_col)));
        let improvements = tenet_list_json(&split_ids(&field(improvements_col)));

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO feedback
                (from_user_id, to_user_id, strengths, improvements, strengths_text, improvements_text)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&from_user_id)
        .bind(&to_user_id)
        .bind(&strengths)
        .bind(&improvements)
        .bind(field(strengths_text_col))
        .bind(field(improvements_text_col))
        .execute(db)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
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

    fn sample_row() -> PeerFeedback {
        PeerFeedback {
            id: 1,
            from_user_id: "emp001".to_string(),
            to_user_id: "emp002".to_string(),
            strengths: r#"["ownership","quality","collaboration"]"#.to_string(),
            improvements: r#"["communication","innovation"]"#.to_string(),
            strengths_text: "Sees things through.".to_string(),
            improvements_text: "Share status earlier.".to_string(),
        }
    }

    #[tokio::test]
    async fn export_then_import_round_trips() {
        let pool = test_pool().await;

        let csv_text = export_feedback_csv(&[sample_row()]).unwrap();
        assert!(csv_text.starts_with("From User ID,To User ID"));
        assert!(csv_text.contains("\"ownership,quality,collaboration\""));

        let inserted = import_feedback_csv(&pool, csv_text.as_bytes()).await.unwrap();
        assert_eq!(inserted, 1);

        let row: (String, String) = sqlx::query_as(
            "SELECT strengths, improvements FROM feedback WHERE from_user_id = 'emp001'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.0, r#"["ownership","quality","collaboration"]"#);
        assert_eq!(row.1, r#"["communication","innovation"]"#);
    }

    #[tokio::test]
    async fn existing_pairs_are_not_overwritten() {
        let pool = test_pool().await;
        let csv_text = export_feedback_csv(&[sample_row()]).unwrap();

        assert_eq!(import_feedback_csv(&pool, csv_text.as_bytes()).await.unwrap(), 1);
        assert_eq!(import_feedback_csv(&pool, csv_text.as_bytes()).await.unwrap(), 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn missing_columns_are_rejected() {
        let pool = test_pool().await;
        let bad = "From User ID,To User ID\nemp001,emp002\n";
        assert!(import_feedback_csv(&pool, bad.as_bytes()).await.is_err());
    }
}
