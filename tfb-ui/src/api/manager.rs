//! Manager feedback and team dashboard
//!
//! Managers record their own tenet highlights and commentary per team
//! member, and the dashboard lists the team with feedback counts. Team
//! membership comes from the orgchart when the manager has a real uid,
//! or from imported recipients in the Workday-only workflow.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tfb_common::db::models::{ManagerFeedback, Person};
use tfb_common::ids::derived_user_id;

use crate::api::identity::require_manager;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SaveManagerFeedbackRequest {
    pub team_member_uid: String,
    #[serde(default)]
    pub selected_strengths: Vec<String>,
    #[serde(default)]
    pub selected_improvements: Vec<String>,
    #[serde(default)]
    pub feedback_text: String,
}

/// POST /api/manager-feedback
///
/// A tenet cannot be both a strength and an improvement; when a
/// selection appears in both lists it is dropped from both before the
/// upsert.
pub async fn save_manager_feedback(
    State(state): State<AppState>,
    Json(req): Json<SaveManagerFeedbackRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let manager = require_manager(&state.db).await?;

    let team_member_uid = req.team_member_uid.trim().to_string();
    if team_member_uid.is_empty() {
        return Err(ApiError::BadRequest("Missing team_member_uid".to_string()));
    }

    for tenet_id in req
        .selected_strengths
        .iter()
        .chain(req.selected_improvements.iter())
    {
        if !state.catalog.contains(tenet_id) {
            return Err(ApiError::BadRequest(format!("Unknown tenet: {}", tenet_id)));
        }
    }

    let overlap: Vec<&String> = req
        .selected_strengths
        .iter()
        .filter(|id| req.selected_improvements.contains(id))
        .collect();
    let strengths: Vec<String> = req
        .selected_strengths
        .iter()
        .filter(|id| !overlap.contains(id))
        .cloned()
        .collect();
    let improvements: Vec<String> = req
        .selected_improvements
        .iter()
        .filter(|id| !overlap.contains(id))
        .cloned()
        .collect();

    sqlx::query(
        r#"
        INSERT INTO manager_feedback
            (manager_uid, team_member_uid, selected_strengths, selected_improvements, feedback_text)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(manager_uid, team_member_uid) DO UPDATE SET
            selected_strengths = excluded.selected_strengths,
            selected_improvements = excluded.selected_improvements,
            feedback_text = excluded.feedback_text
        "#,
    )
    .bind(&manager.effective_uid)
    .bind(&team_member_uid)
    .bind(tfb_common::db::models::tenet_list_json(&strengths))
    .bind(tfb_common::db::models::tenet_list_json(&improvements))
    .bind(req.feedback_text.trim())
    .execute(&state.db)
    .await?;

    tracing::info!(
        manager = %manager.effective_uid,
        team_member = %team_member_uid,
        "saved manager feedback"
    );

    Ok(Json(json!({"success": true})))
}

/// GET /api/manager-feedback/:team_member_uid
pub async fn get_manager_feedback(
    State(state): State<AppState>,
    Path(team_member_uid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let manager = require_manager(&state.db).await?;

    let row: Option<ManagerFeedback> = sqlx::query_as(
        "SELECT * FROM manager_feedback WHERE manager_uid = ? AND team_member_uid = ?",
    )
    .bind(&manager.effective_uid)
    .bind(&team_member_uid)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(json!({
        "success": true,
        "feedback": row.map(|r| r.to_json()),
    })))
}

async fn peer_feedback_count(db: &sqlx::SqlitePool, user_id: &str) -> ApiResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE to_user_id = ?")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

async fn workday_feedback_count(db: &sqlx::SqlitePool, name: &str) -> ApiResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workday_feedback WHERE about = ?")
        .bind(name)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// GET /api/team
///
/// Orgchart managers see their direct reports. Name-only managers see
/// every distinct recipient from the imported spreadsheets, matched back
/// to orgchart people by name when possible.
pub async fn get_team(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let manager = require_manager(&state.db).await?;

    let mut members = Vec::new();

    if let Some(manager_uid) = &manager.manager_uid {
        let reports: Vec<Person> =
            sqlx::query_as("SELECT * FROM persons WHERE manager_uid = ? ORDER BY name")
                .bind(manager_uid)
                .fetch_all(&state.db)
                .await?;

        for person in reports {
            let feedback_count = peer_feedback_count(&state.db, &person.user_id).await?;
            let wd_feedback_count = workday_feedback_count(&state.db, &person.name).await?;
            members.push(json!({
                "user_id": person.user_id,
                "name": person.name,
                "job_title": person.job_title,
                "email": person.email,
                "feedback_count": feedback_count,
                "wd_feedback_count": wd_feedback_count,
            }));
        }
    } else {
        let recipients: Vec<(String, i64)> = sqlx::query_as(
            "SELECT about, COUNT(*) FROM workday_feedback GROUP BY about ORDER BY about",
        )
        .fetch_all(&state.db)
        .await?;

        for (name, wd_feedback_count) in recipients {
            let person: Option<Person> = sqlx::query_as("SELECT * FROM persons WHERE name = ?")
                .bind(&name)
                .fetch_optional(&state.db)
                .await?;

            let (user_id, job_title, email) = match person {
                Some(p) => (p.user_id, p.job_title, p.email),
                None => (derived_user_id(&name), None, None),
            };
            let feedback_count = peer_feedback_count(&state.db, &user_id).await?;
            members.push(json!({
                "user_id": user_id,
                "name": name,
                "job_title": job_title,
                "email": email,
                "feedback_count": feedback_count,
                "wd_feedback_count": wd_feedback_count,
            }));
        }
    }

    Ok(Json(json!({
        "success": true,
        "team": members,
    })))
}

pub fn manager_routes() -> Router<AppState> {
    Router::new()
        .route("/api/manager-feedback", post(save_manager_feedback))
        .route(
            "/api/manager-feedback/:team_member_uid",
            get(get_manager_feedback),
        )
        .route("/api/team", get(get_team))
}
