//! Feedback exchange and PDF export
//!
//! Individuals export their saved feedback as CSV, bundled per
//! receiving manager; managers import those files and download rendered
//! PDF reports.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tfb_common::db::models::PeerFeedback;

use crate::api::identity::{require_current_user, require_manager};
use crate::api::people::read_upload;
use crate::api::report::{build_member_report, check_team_access, resolve_member_by_uid};
use crate::import::peer_csv::{export_feedback_csv, import_feedback_csv};
use crate::{ApiResult, AppState};

/// GET /api/export-list
///
/// The current user's saved feedback grouped by each recipient's
/// manager, so the export page can offer one file per manager.
pub async fn export_list(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_current_user(&state.db).await?;

    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT p.manager_uid, m.name, COUNT(*)
        FROM feedback f
        JOIN persons p ON f.to_user_id = p.user_id
        JOIN persons m ON p.manager_uid = m.user_id
        WHERE f.from_user_id = ?
        GROUP BY p.manager_uid, m.name
        ORDER BY m.name
        "#,
    )
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    let managers: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(manager_uid, manager_name, count)| {
            json!({
                "manager_uid": manager_uid,
                "manager_name": manager_name,
                "feedback_count": count,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "managers": managers,
    })))
}

/// GET /individual/export/:manager_uid
pub async fn export_csv(
    State(state): State<AppState>,
    Path(manager_uid): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = require_current_user(&state.db).await?;

    let rows: Vec<PeerFeedback> = sqlx::query_as(
        r#"
        SELECT f.*
        FROM feedback f
        JOIN persons p ON f.to_user_id = p.user_id
        WHERE f.from_user_id = ? AND p.manager_uid = ?
        ORDER BY f.to_user_id
        "#,
    )
    .bind(&user_id)
    .bind(&manager_uid)
    .fetch_all(&state.db)
    .await?;

    let csv = export_feedback_csv(&rows)?;
    let filename = format!("feedback_for_{}.csv", manager_uid);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    ))
}

/// POST /manager/import
pub async fn import_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let (bytes, _fields) = read_upload(multipart).await?;
    let count = import_feedback_csv(&state.db, &bytes).await?;
    tracing::info!(count, "imported peer feedback rows");
    Ok(Json(json!({"success": true, "count": count})))
}

/// GET /manager/export-pdf/:user_id
pub async fn export_pdf(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let manager = require_manager(&state.db).await?;
    let member = resolve_member_by_uid(&state.db, &user_id).await?;
    check_team_access(&manager, &member)?;

    let report = build_member_report(&state, &manager, member).await?;
    let bytes = crate::pdf::render_report(&state.catalog, &report)?;

    let filename = format!(
        "Feedback_Report_{}_{}.pdf",
        report.member.name.replace(' ', "_"),
        Utc::now().format("%Y%m%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/api/export-list", get(export_list))
        .route("/individual/export/:manager_uid", get(export_csv))
        .route("/manager/import", post(import_csv))
        .route("/manager/export-pdf/:user_id", get(export_pdf))
}
