//! Workday spreadsheet import and queries
//!
//! Upload endpoint plus read-side queries over imported rows: filtered
//! listings, per-recipient counts, and month buckets for the date-range
//! picker.

use axum::{
    extract::{Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Months, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tfb_common::db::models::WorkdayFeedback;

use crate::api::people::read_upload;
use crate::import::workday::import_workday_xlsx;
use crate::{ApiError, ApiResult, AppState};

/// POST /manager/import-xlsx
pub async fn import_xlsx(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let (bytes, _fields) = read_upload(multipart).await?;
    let report = import_workday_xlsx(&state.db, &bytes).await;
    tracing::info!(
        imported = report.imported,
        duplicates = report.skipped_duplicates,
        "workday import finished"
    );
    Ok(Json(report.to_json()))
}

#[derive(Debug, Deserialize)]
pub struct WorkdayQuery {
    pub about: Option<String>,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_filter_date(raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date format".to_string()))
}

/// Lower date bound for a relative period. Only `all` means no bound;
/// unrecognized values fall back to the default three-month window.
fn period_cutoff(period: Option<&str>) -> Option<String> {
    let months = match period.unwrap_or("3m") {
        "all" => return None,
        "6m" => 6,
        "12m" => 12,
        _ => 3,
    };
    Utc::now()
        .naive_utc()
        .checked_sub_months(Months::new(months))
        .map(|cutoff| cutoff.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// GET /api/workday-feedback
///
/// Explicit start/end dates override the relative period. Rows come
/// back newest first; stored dates are RFC 3339 TEXT, so string
/// comparison is chronological.
pub async fn list_workday_feedback(
    State(state): State<AppState>,
    Query(query): Query<WorkdayQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut sql = String::from("SELECT * FROM workday_feedback WHERE 1=1");
    let mut binds: Vec<String> = Vec::new();

    if let Some(about) = query.about.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(" AND about = ?");
        binds.push(about.to_string());
    }

    if query.start_date.is_some() || query.end_date.is_some() {
        if let Some(start) = query.start_date.as_deref().filter(|s| !s.is_empty()) {
            let start = parse_filter_date(start)?;
            sql.push_str(" AND date >= ?");
            binds.push(format!("{}T00:00:00", start.format("%Y-%m-%d")));
        }
        if let Some(end) = query.end_date.as_deref().filter(|s| !s.is_empty()) {
            let end = parse_filter_date(end)?;
            sql.push_str(" AND date <= ?");
            binds.push(format!("{}T23:59:59", end.format("%Y-%m-%d")));
        }
    } else if let Some(cutoff) = period_cutoff(query.period.as_deref()) {
        sql.push_str(" AND date >= ?");
        binds.push(cutoff);
    }

    sql.push_str(" ORDER BY date DESC");

    let mut q = sqlx::query_as::<_, WorkdayFeedback>(&sql);
    for bind in &binds {
        q = q.bind(bind);
    }
    let rows = q.fetch_all(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "count": rows.len(),
        "feedback": rows.iter().map(|r| r.to_json()).collect::<Vec<_>>(),
    })))
}

/// GET /api/workday-feedback/recipients
pub async fn list_recipients(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT about,
               COUNT(*),
               SUM(CASE WHEN is_structured = 1 THEN 1 ELSE 0 END)
        FROM workday_feedback
        GROUP BY about
        ORDER BY about
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let recipients: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(about, total, structured)| {
            json!({
                "about": about,
                "total": total,
                "structured": structured,
                "generic": total - structured,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "recipients": recipients,
    })))
}

/// GET /api/workday-feedback/date-ranges
///
/// Month buckets for the UI's period picker, newest month first.
pub async fn list_date_ranges(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT substr(date, 1, 4) AS year,
               substr(date, 6, 2) AS month,
               COUNT(*)
        FROM workday_feedback
        WHERE date IS NOT NULL
        GROUP BY year, month
        ORDER BY year DESC, month DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let ranges: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(year, month, count)| json!({"year": year, "month": month, "count": count}))
        .collect();

    Ok(Json(json!({
        "success": true,
        "date_ranges": ranges,
    })))
}

pub fn workday_routes() -> Router<AppState> {
    Router::new()
        .route("/manager/import-xlsx", post(import_xlsx))
        .route("/api/workday-feedback", get(list_workday_feedback))
        .route("/api/workday-feedback/recipients", get(list_recipients))
        .route("/api/workday-feedback/date-ranges", get(list_date_ranges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_period_has_no_cutoff() {
        assert_eq!(period_cutoff(Some("all")), None);
    }

    #[test]
    fn missing_period_defaults_to_three_months() {
        let cutoff = period_cutoff(None).unwrap();
        let expected = Utc::now()
            .naive_utc()
            .checked_sub_months(Months::new(3))
            .unwrap()
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        // Same second unless the clock ticks between the two calls.
        assert_eq!(cutoff[..13], expected[..13]);
    }

    #[test]
    fn unrecognized_period_defaults_to_three_months() {
        let unknown = period_cutoff(Some("2w")).unwrap();
        let default = period_cutoff(Some("3m")).unwrap();
        assert_eq!(unknown[..13], default[..13]);
    }

    #[test]
    fn longer_periods_have_earlier_cutoffs() {
        let three = period_cutoff(Some("3m")).unwrap();
        let six = period_cutoff(Some("6m")).unwrap();
        let twelve = period_cutoff(Some("12m")).unwrap();
        assert!(six < three);
        assert!(twelve < six);
    }

    #[test]
    fn filter_dates_parse_or_reject() {
        assert!(parse_filter_date("2026-03-14").is_ok());
        assert!(parse_filter_date("14/03/2026").is_err());
        assert!(parse_filter_date("yesterday").is_err());
    }
}
