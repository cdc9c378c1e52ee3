//! Person directory endpoints: orgchart import, people lists, stats

use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tfb_common::db::models::Person;

use crate::import::orgchart::import_orgchart_csv;
use crate::{ApiError, ApiResult, AppState};

/// Pull the uploaded file (and optional extra text fields) out of a
/// multipart form.
pub async fn read_upload(
    mut multipart: Multipart,
) -> ApiResult<(Vec<u8>, std::collections::HashMap<String, String>)> {
    let mut file: Option<Vec<u8>> = None;
    let mut fields = std::collections::HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
            file = Some(bytes.to_vec());
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
            fields.insert(name, value);
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    if file.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }
    Ok((file, fields))
}

/// POST /api/import-orgchart
///
/// Multipart upload of the orgchart CSV; `reset=true` clears people and
/// all feedback first.
pub async fn import_orgchart(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let (file, fields) = read_upload(multipart).await?;
    let reset = fields
        .get("reset")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let report = import_orgchart_csv(&state.db, &file, reset).await?;
    tracing::info!(
        "Orgchart import: {} new, {} updated (reset={})",
        report.new_count,
        report.updated_count,
        report.reset
    );

    Ok(Json(json!({
        "success": true,
        "new_count": report.new_count,
        "updated_count": report.updated_count,
        "reset": report.reset,
    })))
}

/// GET /api/people
pub async fn list_people(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let people: Vec<Person> = sqlx::query_as("SELECT * FROM persons ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(json!({"success": true, "people": people})))
}

/// GET /api/managers
///
/// People with at least one direct report.
pub async fn list_managers(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let managers: Vec<Person> = sqlx::query_as(
        "SELECT * FROM persons WHERE user_id IN \
         (SELECT DISTINCT manager_uid FROM persons WHERE manager_uid IS NOT NULL) \
         ORDER BY name",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(json!({"success": true, "managers": managers})))
}

/// GET /api/db-stats
pub async fn db_stats(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let total_people: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons")
        .fetch_one(&state.db)
        .await?;
    let managers: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM persons WHERE user_id IN \
         (SELECT DISTINCT manager_uid FROM persons WHERE manager_uid IS NOT NULL)",
    )
    .fetch_one(&state.db)
    .await?;
    let peer_feedback: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
        .fetch_one(&state.db)
        .await?;
    let manager_reviews: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM manager_feedback")
        .fetch_one(&state.db)
        .await?;
    let workday_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workday_feedback")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(json!({
        "success": true,
        "total_people": total_people,
        "managers": managers,
        "team_members": total_people - managers,
        "peer_feedback": peer_feedback,
        "manager_reviews": manager_reviews,
        "workday_feedback": workday_rows,
    })))
}

pub fn people_routes() -> Router<AppState> {
    Router::new()
        .route("/api/import-orgchart", post(import_orgchart))
        .route("/api/people", get(list_people))
        .route("/api/managers", get(list_managers))
        .route("/api/db-stats", get(db_stats))
}
