//! Database models
//!
//! Tenet selections are persisted as JSON arrays of tenet ids in TEXT
//! columns. Dates are RFC 3339 TEXT so lexicographic comparison matches
//! chronological order.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;

/// Parse a JSON tenet-id array column, treating NULL/empty as no tenets.
pub fn parse_tenet_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(s) if !s.is_empty() => serde_json::from_str(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Serialize tenet ids for storage.
pub fn tenet_list_json(tenet_ids: &[String]) -> String {
    serde_json::to_string(tenet_ids).unwrap_or_else(|_| "[]".to_string())
}

/// Person imported from an orgchart export
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub user_id: String,
    pub name: String,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub manager_uid: Option<String>,
}

/// Peer feedback from one person to another.
///
/// One row per (giver, receiver) pair; the auto-save UI updates it in
/// place until the author deletes it.
#[derive(Debug, Clone, FromRow)]
pub struct PeerFeedback {
    pub id: i64,
    pub from_user_id: String,
    pub to_user_id: String,
    pub strengths: String,
    pub improvements: String,
    pub strengths_text: String,
    pub improvements_text: String,
}

impl PeerFeedback {
    pub fn strengths(&self) -> Vec<String> {
        parse_tenet_list(Some(&self.strengths))
    }

    pub fn improvements(&self) -> Vec<String> {
        parse_tenet_list(Some(&self.improvements))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "from_user_id": self.from_user_id,
            "to_user_id": self.to_user_id,
            "strengths": self.strengths(),
            "improvements": self.improvements(),
            "strengths_text": self.strengths_text,
            "improvements_text": self.improvements_text,
        })
    }
}

/// Manager's own feedback for a team member.
///
/// `team_member_uid` is either a real orgchart user id or a derived
/// `wd_` id for people known only from Workday imports.
#[derive(Debug, Clone, FromRow)]
pub struct ManagerFeedback {
    pub id: i64,
    pub manager_uid: String,
    pub team_member_uid: String,
    pub selected_strengths: String,
    pub selected_improvements: String,
    pub feedback_text: String,
}

impl ManagerFeedback {
    pub fn selected_strengths(&self) -> Vec<String> {
        parse_tenet_list(Some(&self.selected_strengths))
    }

    pub fn selected_improvements(&self) -> Vec<String> {
        parse_tenet_list(Some(&self.selected_improvements))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "manager_uid": self.manager_uid,
            "team_member_uid": self.team_member_uid,
            "selected_strengths": self.selected_strengths(),
            "selected_improvements": self.selected_improvements(),
            "feedback_text": self.feedback_text,
        })
    }
}

/// Feedback row imported from a Workday spreadsheet export.
///
/// Structured rows carry a parsed tenet selection; generic rows are
/// stored verbatim and excluded from tenet aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct WorkdayFeedback {
    pub id: i64,
    pub about: String,
    pub from_name: String,
    pub question: Option<String>,
    pub feedback: Option<String>,
    pub asked_by: Option<String>,
    pub request_type: Option<String>,
    pub date: Option<String>,
    pub is_structured: i64,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub strengths_text: Option<String>,
    pub improvements_text: Option<String>,
    pub content_hash: String,
}

impl WorkdayFeedback {
    pub fn is_structured(&self) -> bool {
        self.is_structured != 0
    }

    pub fn strengths(&self) -> Vec<String> {
        parse_tenet_list(self.strengths.as_deref())
    }

    pub fn improvements(&self) -> Vec<String> {
        parse_tenet_list(self.improvements.as_deref())
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "about": self.about,
            "from_name": self.from_name,
            "question": self.question,
            "feedback": self.feedback,
            "asked_by": self.asked_by,
            "request_type": self.request_type,
            "date": self.date,
            "is_structured": self.is_structured(),
            "strengths": self.strengths(),
            "improvements": self.improvements(),
            "strengths_text": self.strengths_text,
            "improvements_text": self.improvements_text,
        })
    }
}
