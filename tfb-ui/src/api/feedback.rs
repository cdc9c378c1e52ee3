//! Peer feedback endpoints
//!
//! Backing for the auto-save form: upsert on save, list for initial
//! state, delete when the author withdraws. Tenet counts are enforced
//! here at the submission boundary, not in storage.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tfb_common::db::models::{tenet_list_json, PeerFeedback};

use crate::api::identity::require_current_user;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SaveFeedbackRequest {
    pub to_user_id: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub strengths_text: String,
    #[serde(default)]
    pub improvements_text: String,
}

/// POST /api/feedback
///
/// Exactly 3 strengths and 2-3 improvements, else 400.
pub async fn save_feedback(
    State(state): State<AppState>,
    Json(req): Json<SaveFeedbackRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let from_user_id = require_current_user(&state.db).await?;

    if req.to_user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing to_user_id".to_string()));
    }
    if req.strengths.len() != 3 {
        return Err(ApiError::BadRequest(
            "Must select exactly 3 strengths".to_string(),
        ));
    }
    if req.improvements.len() < 2 || req.improvements.len() > 3 {
        return Err(ApiError::BadRequest(
            "Must select 2-3 improvements".to_string(),
        ));
    }

    for tenet_id in req.strengths.iter().chain(req.improvements.iter()) {
        if !state.catalog.contains(tenet_id) {
            return Err(ApiError::BadRequest(format!("Unknown tenet: {}", tenet_id)));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO feedback
            (from_user_id, to_user_id, strengths, improvements, strengths_text, improvements_text)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(from_user_id, to_user_id) DO UPDATE SET
            strengths = excluded.strengths,
            improvements = excluded.improvements,
            strengths_text = excluded.strengths_text,
            improvements_text = excluded.improvements_text
        "#,
    )
    .bind(&from_user_id)
    .bind(req.to_user_id.trim())
    .bind(tenet_list_json(&req.strengths))
    .bind(tenet_list_json(&req.improvements))
    .bind(&req.strengths_text)
    .bind(&req.improvements_text)
    .execute(&state.db)
    .await?;

    Ok(Json(json!({"success": true})))
}

/// GET /api/feedback
///
/// All feedback given by the current user.
pub async fn list_feedback(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let from_user_id = require_current_user(&state.db).await?;

    let rows: Vec<PeerFeedback> =
        sqlx::query_as("SELECT * FROM feedback WHERE from_user_id = ? ORDER BY to_user_id")
            .bind(&from_user_id)
            .fetch_all(&state.db)
            .await?;

    let feedback: Vec<serde_json::Value> = rows.iter().map(|f| f.to_json()).collect();
    Ok(Json(json!({"success": true, "feedback": feedback})))
}

/// GET /api/tenets
///
/// The active catalog, in display order, for the feedback forms.
pub async fn list_tenets(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(json!({"success": true, "tenets": state.catalog.tenets()})))
}

/// DELETE /api/feedback/:to_user_id
///
/// Idempotent: deleting feedback that doesn't exist still succeeds.
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(to_user_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let from_user_id = require_current_user(&state.db).await?;

    sqlx::query("DELETE FROM feedback WHERE from_user_id = ? AND to_user_id = ?")
        .bind(&from_user_id)
        .bind(&to_user_id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({"success": true})))
}

pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/api/feedback", post(save_feedback).get(list_feedback))
        .route("/api/feedback/:to_user_id", delete(delete_feedback))
        .route("/api/tenets", get(list_tenets))
}
