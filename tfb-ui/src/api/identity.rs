//! Identity selection
//!
//! The tool is single-user and local, so "who am I" lives in the
//! settings table rather than browser sessions. Individuals pick a user
//! id to give feedback as; managers pick either their orgchart uid or,
//! for the Workday-only workflow, just their display name.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tfb_common::db::settings::{
    clear_setting, get_setting, set_setting, KEY_CURRENT_USER, KEY_MANAGER_NAME, KEY_MANAGER_UID,
};
use tfb_common::ids::derived_user_id;

use crate::{ApiError, ApiResult, AppState};

/// The user currently giving peer feedback, or 400 when none selected.
pub async fn require_current_user(db: &SqlitePool) -> ApiResult<String> {
    get_setting(db, KEY_CURRENT_USER)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No user selected".to_string()))
}

/// Manager identity resolved to an effective uid.
///
/// Orgchart managers use their real uid; name-only managers get the
/// derived `wd_` id so their own feedback still has a stable key.
pub struct ManagerIdentity {
    pub effective_uid: String,
    pub manager_uid: Option<String>,
    pub manager_name: Option<String>,
}

pub async fn require_manager(db: &SqlitePool) -> ApiResult<ManagerIdentity> {
    let manager_uid = get_setting(db, KEY_MANAGER_UID).await?;
    let manager_name = get_setting(db, KEY_MANAGER_NAME).await?;

    let effective_uid = match (&manager_uid, &manager_name) {
        (Some(uid), _) => uid.clone(),
        (None, Some(name)) => derived_user_id(name),
        (None, None) => return Err(ApiError::BadRequest("No manager selected".to_string())),
    };

    Ok(ManagerIdentity {
        effective_uid,
        manager_uid,
        manager_name,
    })
}

/// GET /api/identity
pub async fn get_identity(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_setting(&state.db, KEY_CURRENT_USER).await?;
    let manager_uid = get_setting(&state.db, KEY_MANAGER_UID).await?;
    let manager_name = get_setting(&state.db, KEY_MANAGER_NAME).await?;

    Ok(Json(json!({
        "success": true,
        "user_id": user_id,
        "manager_uid": manager_uid,
        "manager_name": manager_name,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SetUserRequest {
    pub user_id: String,
}

/// POST /api/set-user
///
/// Any user id is accepted, even one not in the orgchart - external
/// feedback providers are legitimate givers.
pub async fn set_user(
    State(state): State<AppState>,
    Json(req): Json<SetUserRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing user_id".to_string()));
    }
    set_setting(&state.db, KEY_CURRENT_USER, req.user_id.trim()).await?;
    Ok(Json(json!({"success": true})))
}

/// POST /api/switch-user
pub async fn switch_user(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    clear_setting(&state.db, KEY_CURRENT_USER).await?;
    Ok(Json(json!({"success": true})))
}

#[derive(Debug, Deserialize)]
pub struct SetManagerRequest {
    pub manager_uid: Option<String>,
    pub manager_name: Option<String>,
}

/// POST /api/set-manager
///
/// Either an orgchart uid (must exist, 404 otherwise) or a bare display
/// name for the Workday-only workflow. Setting one clears the other.
pub async fn set_manager(
    State(state): State<AppState>,
    Json(req): Json<SetManagerRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    match (req.manager_uid, req.manager_name) {
        (Some(uid), _) if !uid.trim().is_empty() => {
            let uid = uid.trim();
            let exists: Option<(String,)> =
                sqlx::query_as("SELECT user_id FROM persons WHERE user_id = ?")
                    .bind(uid)
                    .fetch_optional(&state.db)
                    .await?;
            if exists.is_none() {
                return Err(ApiError::NotFound("Manager not found".to_string()));
            }
            set_setting(&state.db, KEY_MANAGER_UID, uid).await?;
            clear_setting(&state.db, KEY_MANAGER_NAME).await?;
            Ok(Json(json!({"success": true})))
        }
        (_, Some(name)) if !name.trim().is_empty() => {
            set_setting(&state.db, KEY_MANAGER_NAME, name.trim()).await?;
            clear_setting(&state.db, KEY_MANAGER_UID).await?;
            Ok(Json(json!({"success": true})))
        }
        _ => Err(ApiError::BadRequest(
            "Missing manager_uid or manager_name".to_string(),
        )),
    }
}

/// POST /api/switch-manager
pub async fn switch_manager(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    clear_setting(&state.db, KEY_MANAGER_UID).await?;
    clear_setting(&state.db, KEY_MANAGER_NAME).await?;
    Ok(Json(json!({"success": true})))
}

pub fn identity_routes() -> Router<AppState> {
    Router::new()
        .route("/api/identity", get(get_identity))
        .route("/api/set-user", post(set_user))
        .route("/api/switch-user", post(switch_user))
        .route("/api/set-manager", post(set_manager))
        .route("/api/switch-manager", post(switch_manager))
}
