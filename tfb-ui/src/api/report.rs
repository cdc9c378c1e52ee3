//! Per-member and team reports
//!
//! Resolves a team member (orgchart uid, derived `wd_` id, or bare
//! name), aggregates every feedback source into butterfly data, and
//! serves the report payloads the UI and PDF export render.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tfb_common::db::models::{ManagerFeedback, PeerFeedback, Person, WorkdayFeedback};
use tfb_common::ids::{derived_user_id, is_derived_id};

use crate::aggregate::{butterfly_data, TenetCount, TenetTallies};
use crate::api::identity::{require_manager, ManagerIdentity};
use crate::{ApiError, ApiResult, AppState};

/// A team member resolved to both an id and a display name.
#[derive(Debug, Clone)]
pub struct ResolvedMember {
    pub user_id: String,
    pub name: String,
    pub job_title: Option<String>,
    pub email: Option<String>,
    /// Manager uid from the orgchart, None for Workday-only members.
    pub orgchart_manager_uid: Option<String>,
    pub in_orgchart: bool,
}

impl ResolvedMember {
    fn from_person(person: Person) -> Self {
        Self {
            user_id: person.user_id,
            name: person.name,
            job_title: person.job_title,
            email: person.email,
            orgchart_manager_uid: person.manager_uid,
            in_orgchart: true,
        }
    }

    fn from_name(name: String) -> Self {
        Self {
            user_id: derived_user_id(&name),
            name,
            job_title: None,
            email: None,
            orgchart_manager_uid: None,
            in_orgchart: false,
        }
    }
}

/// Map a derived `wd_` id back to the recipient name it was minted from.
async fn name_for_derived_id(db: &SqlitePool, user_id: &str) -> ApiResult<Option<String>> {
    let names: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT about FROM workday_feedback ORDER BY about")
            .fetch_all(db)
            .await?;
    Ok(names
        .into_iter()
        .map(|(name,)| name)
        .find(|name| derived_user_id(name) == user_id))
}

pub async fn resolve_member_by_uid(db: &SqlitePool, user_id: &str) -> ApiResult<ResolvedMember> {
    let person: Option<Person> = sqlx::query_as("SELECT * FROM persons WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    if let Some(person) = person {
        return Ok(ResolvedMember::from_person(person));
    }
    if is_derived_id(user_id) {
        if let Some(name) = name_for_derived_id(db, user_id).await? {
            return Ok(ResolvedMember::from_name(name));
        }
    }
    Err(ApiError::NotFound("Team member not found".to_string()))
}

pub async fn resolve_member_by_name(db: &SqlitePool, name: &str) -> ApiResult<ResolvedMember> {
    let person: Option<Person> = sqlx::query_as("SELECT * FROM persons WHERE name = ?")
        .bind(name)
        .fetch_optional(db)
        .await?;
    if let Some(person) = person {
        return Ok(ResolvedMember::from_person(person));
    }
    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workday_feedback WHERE about = ?")
        .bind(name)
        .fetch_one(db)
        .await?;
    if known > 0 {
        return Ok(ResolvedMember::from_name(name.to_string()));
    }
    Err(ApiError::NotFound("Team member not found".to_string()))
}

/// Team-membership check. Only enforceable when both sides are in the
/// orgchart; Workday-only members are visible to any selected manager.
pub fn check_team_access(manager: &ManagerIdentity, member: &ResolvedMember) -> ApiResult<()> {
    if let (Some(manager_uid), true) = (&manager.manager_uid, member.in_orgchart) {
        if member.orgchart_manager_uid.as_deref() != Some(manager_uid.as_str()) {
            return Err(ApiError::Forbidden(
                "Team member not in your team".to_string(),
            ));
        }
    }
    Ok(())
}

/// All feedback for one member, aggregated and listed per source.
pub struct MemberReport {
    pub member: ResolvedMember,
    pub butterfly: Vec<TenetCount>,
    pub feedbacks: Vec<serde_json::Value>,
    pub generic_feedbacks: Vec<serde_json::Value>,
    pub manager_feedback: Option<ManagerFeedback>,
}

/// Add one member's feedback into `tallies` and return the per-source
/// listings. Shared by the single-member report and the team rollup.
async fn collect_member_feedback(
    state: &AppState,
    manager: &ManagerIdentity,
    member: &ResolvedMember,
    tallies: &mut TenetTallies,
) -> ApiResult<(
    Vec<serde_json::Value>,
    Vec<serde_json::Value>,
    Option<ManagerFeedback>,
)> {
    let mut feedbacks = Vec::new();
    let mut generic_feedbacks = Vec::new();

    let peer_rows: Vec<PeerFeedback> =
        sqlx::query_as("SELECT * FROM feedback WHERE to_user_id = ? ORDER BY from_user_id")
            .bind(&member.user_id)
            .fetch_all(&state.db)
            .await?;
    for row in &peer_rows {
        tallies.add_strengths(row.strengths());
        tallies.add_improvements(row.improvements());

        let giver: Option<(String,)> = sqlx::query_as("SELECT name FROM persons WHERE user_id = ?")
            .bind(&row.from_user_id)
            .fetch_optional(&state.db)
            .await?;
        let from_name = giver
            .map(|(name,)| name)
            .unwrap_or_else(|| row.from_user_id.clone());

        let mut entry = row.to_json();
        entry["from_name"] = json!(from_name);
        entry["source"] = json!("peer");
        feedbacks.push(entry);
    }

    let workday_rows: Vec<WorkdayFeedback> =
        sqlx::query_as("SELECT * FROM workday_feedback WHERE about = ? ORDER BY date DESC")
            .bind(&member.name)
            .fetch_all(&state.db)
            .await?;
    for row in &workday_rows {
        if row.is_structured() {
            tallies.add_strengths(row.strengths());
            tallies.add_improvements(row.improvements());
            let mut entry = row.to_json();
            entry["source"] = json!("workday");
            feedbacks.push(entry);
        } else {
            generic_feedbacks.push(row.to_json());
        }
    }

    let manager_row: Option<ManagerFeedback> = sqlx::query_as(
        "SELECT * FROM manager_feedback WHERE manager_uid = ? AND team_member_uid = ?",
    )
    .bind(&manager.effective_uid)
    .bind(&member.user_id)
    .fetch_optional(&state.db)
    .await?;
    if let Some(row) = &manager_row {
        tallies.add_strengths(row.selected_strengths());
        tallies.add_improvements(row.selected_improvements());
    }

    Ok((feedbacks, generic_feedbacks, manager_row))
}

pub async fn build_member_report(
    state: &AppState,
    manager: &ManagerIdentity,
    member: ResolvedMember,
) -> ApiResult<MemberReport> {
    let mut tallies = TenetTallies::new();
    let (feedbacks, generic_feedbacks, manager_feedback) =
        collect_member_feedback(state, manager, &member, &mut tallies).await?;

    Ok(MemberReport {
        butterfly: butterfly_data(&state.catalog, &tallies),
        member,
        feedbacks,
        generic_feedbacks,
        manager_feedback,
    })
}

fn report_json(state: &AppState, report: &MemberReport) -> serde_json::Value {
    json!({
        "success": true,
        "team_member": {
            "user_id": report.member.user_id,
            "name": report.member.name,
            "job_title": report.member.job_title,
            "email": report.member.email,
        },
        "butterfly_data": report.butterfly,
        "feedbacks": report.feedbacks,
        "generic_feedbacks": report.generic_feedbacks,
        "manager_feedback": report.manager_feedback.as_ref().map(|r| r.to_json()),
        "tenets": state.catalog.tenets(),
    })
}

/// GET /api/report/:user_id
pub async fn member_report(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let manager = require_manager(&state.db).await?;
    let member = resolve_member_by_uid(&state.db, &user_id).await?;
    check_team_access(&manager, &member)?;
    let report = build_member_report(&state, &manager, member).await?;
    Ok(Json(report_json(&state, &report)))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub name: String,
}

/// GET /api/report?name=
pub async fn member_report_by_name(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let manager = require_manager(&state.db).await?;
    let member = resolve_member_by_name(&state.db, &query.name).await?;
    check_team_access(&manager, &member)?;
    let report = build_member_report(&state, &manager, member).await?;
    Ok(Json(report_json(&state, &report)))
}

/// The manager's team as resolved members, mirroring GET /api/team.
async fn team_members(
    state: &AppState,
    manager: &ManagerIdentity,
) -> ApiResult<Vec<ResolvedMember>> {
    if let Some(manager_uid) = &manager.manager_uid {
        let reports: Vec<Person> =
            sqlx::query_as("SELECT * FROM persons WHERE manager_uid = ? ORDER BY name")
                .bind(manager_uid)
                .fetch_all(&state.db)
                .await?;
        Ok(reports.into_iter().map(ResolvedMember::from_person).collect())
    } else {
        let names: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT about FROM workday_feedback ORDER BY about")
                .fetch_all(&state.db)
                .await?;
        let mut members = Vec::new();
        for (name,) in names {
            let person: Option<Person> = sqlx::query_as("SELECT * FROM persons WHERE name = ?")
                .bind(&name)
                .fetch_optional(&state.db)
                .await?;
            members.push(match person {
                Some(p) => ResolvedMember::from_person(p),
                None => ResolvedMember::from_name(name),
            });
        }
        Ok(members)
    }
}

/// GET /api/team-butterfly-data
///
/// One aggregation across the whole team instead of per member.
pub async fn team_butterfly(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let manager = require_manager(&state.db).await?;
    let members = team_members(&state, &manager).await?;

    let mut tallies = TenetTallies::new();
    for member in &members {
        collect_member_feedback(&state, &manager, member, &mut tallies).await?;
    }

    Ok(Json(json!({
        "success": true,
        "team_size": members.len(),
        "butterfly_data": butterfly_data(&state.catalog, &tallies),
    })))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/report", get(member_report_by_name))
        .route("/api/report/:user_id", get(member_report))
        .route("/api/team-butterfly-data", get(team_butterfly))
}
