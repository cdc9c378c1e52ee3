//! Demo data seeding
//!
//! `--generate-sample` populates the database with a fictitious
//! 12-person team, peer feedback, manager highlights, and imported
//! rows in both structured and generic form. Selection is deterministic
//! (rotating over the catalog) so repeated runs produce the same data.

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tfb_common::db::models::tenet_list_json;
use tfb_common::TenetCatalog;

use crate::import::workday::{content_hash, parse_structured};

/// What got seeded, for the CLI summary line.
#[derive(Debug, Default)]
pub struct SampleReport {
    pub people: u64,
    pub peer_feedback: u64,
    pub manager_feedback: u64,
    pub workday_rows: u64,
}

const MANAGER: (&str, &str, &str) = ("dgate", "Della Gate", "Engineering Manager");

const TEAM: &[(&str, &str, &str)] = &[
    ("pduty", "Paige Duty", "Staff SRE"),
    ("llatency", "Lee Latency", "Senior Software Developer"),
    ("mtorr", "Mona Torr", "Senior SRE"),
    ("rrollback", "Robin Rollback", "Software Developer"),
    ("kcanary", "Kenny Canary", "Software Developer"),
    ("tloggins", "Tracey Loggins", "Senior SRE"),
    ("sell", "Sue Q. Ell", "Senior Software Developer"),
    ("jblob", "Jason Blob", "Software Developer"),
    ("aert", "Al Ert", "Staff SRE"),
    ("amin", "Addie Min", "Senior Software Developer"),
    ("tout", "Tim Out", "Software Developer"),
    ("bque", "Barbie Que", "Senior SRE"),
];

const LOCATIONS: &[&str] = &[
    "Raleigh NC",
    "Boston MA",
    "Remote US CA",
    "Remote UK",
    "Brno CZ",
    "Pune IN",
];

const GENERIC_COMMENTS: &[&str] = &[
    "Always willing to jump on incidents and share what they learned afterwards.",
    "Great partner on the migration project; kept everyone informed throughout.",
    "Consistently delivers solid work, would appreciate earlier design reviews.",
];

/// Pick `count` tenet ids starting at `offset`, wrapping around the
/// catalog and skipping anything in `exclude`.
fn pick_tenets(catalog: &TenetCatalog, offset: usize, count: usize, exclude: &[String]) -> Vec<String> {
    let ids: Vec<&str> = catalog.tenets().iter().map(|t| t.id.as_str()).collect();
    let mut picked = Vec::new();
    let mut i = offset;
    while picked.len() < count && picked.len() + exclude.len() < ids.len() {
        let id = ids[i % ids.len()];
        if !exclude.iter().any(|e| e == id) && !picked.iter().any(|p: &String| p == id) {
            picked.push(id.to_string());
        }
        i += 1;
    }
    picked
}

async fn clear_all(db: &SqlitePool) -> Result<()> {
    for table in ["workday_feedback", "manager_feedback", "feedback", "persons", "settings"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(db)
            .await?;
    }
    Ok(())
}

async fn seed_people(db: &SqlitePool, report: &mut SampleReport) -> Result<()> {
    let (manager_uid, manager_name, manager_title) = MANAGER;
    sqlx::query(
        "INSERT INTO persons (user_id, name, job_title, location, email, manager_uid)
         VALUES (?, ?, ?, ?, ?, NULL)",
    )
    .bind(manager_uid)
    .bind(manager_name)
    .bind(manager_title)
    .bind("Raleigh NC")
    .bind(format!("{}@example.com", manager_uid))
    .execute(db)
    .await?;
    report.people += 1;

    for (i, (user_id, name, job_title)) in TEAM.iter().enumerate() {
        sqlx::query(
            "INSERT INTO persons (user_id, name, job_title, location, email, manager_uid)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(job_title)
        .bind(LOCATIONS[i % LOCATIONS.len()])
        .bind(format!("{}@example.com", user_id))
        .bind(manager_uid)
        .execute(db)
        .await?;
        report.people += 1;
    }
    Ok(())
}

async fn seed_peer_feedback(
    db: &SqlitePool,
    catalog: &TenetCatalog,
    report: &mut SampleReport,
) -> Result<()> {
    // Each member reviews the next three colleagues in the list.
    for (i, (from_uid, _, _)) in TEAM.iter().enumerate() {
        for step in 1..=3 {
            let (to_uid, to_name, _) = TEAM[(i + step) % TEAM.len()];
            let strengths = pick_tenets(catalog, i + step, 3, &[]);
            let improvements = pick_tenets(catalog, i + step + 3, if step == 1 { 2 } else { 3 }, &strengths);

            sqlx::query(
                "INSERT INTO feedback
                     (from_user_id, to_user_id, strengths, improvements, strengths_text, improvements_text)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(from_uid)
            .bind(to_uid)
            .bind(tenet_list_json(&strengths))
            .bind(tenet_list_json(&improvements))
            .bind(format!(
                "These are standout strengths for {}. They handle challenges in these areas with expertise.",
                to_name
            ))
            .bind(format!(
                "While {} has many strengths, these areas could use some refinement.",
                to_name
            ))
            .execute(db)
            .await?;
            report.peer_feedback += 1;
        }
    }
    Ok(())
}

async fn seed_manager_feedback(
    db: &SqlitePool,
    catalog: &TenetCatalog,
    report: &mut SampleReport,
) -> Result<()> {
    let (manager_uid, _, _) = MANAGER;
    // Highlights for the first half of the team only, so the dashboard
    // shows both reviewed and pending members.
    for (i, (member_uid, member_name, _)) in TEAM.iter().take(TEAM.len() / 2).enumerate() {
        let strengths = pick_tenets(catalog, i, 2, &[]);
        let improvements = pick_tenets(catalog, i + 4, 1, &strengths);

        sqlx::query(
            "INSERT INTO manager_feedback
                 (manager_uid, team_member_uid, selected_strengths, selected_improvements, feedback_text)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(manager_uid)
        .bind(member_uid)
        .bind(tenet_list_json(&strengths))
        .bind(tenet_list_json(&improvements))
        .bind(format!(
            "Peer feedback confirms {}'s strengths align with team expectations. \
             Continue leveraging strengths while addressing improvement areas.",
            member_name
        ))
        .execute(db)
        .await?;
        report.manager_feedback += 1;
    }
    Ok(())
}

async fn insert_workday_row(
    db: &SqlitePool,
    about: &str,
    from_name: &str,
    raw_text: &str,
    days_ago: i64,
    report: &mut SampleReport,
) -> Result<()> {
    let structured = parse_structured(raw_text);
    let date = (Utc::now() - Duration::days(days_ago))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    let hash = content_hash(about, from_name, raw_text);

    let result = sqlx::query(
        "INSERT OR IGNORE INTO workday_feedback
             (about, from_name, question, feedback, asked_by, request_type, date,
              is_structured, strengths, improvements, strengths_text, improvements_text, content_hash)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(about)
    .bind(from_name)
    .bind("What feedback do you have?")
    .bind(raw_text)
    .bind(about)
    .bind("Requested by Self")
    .bind(&date)
    .bind(structured.is_some() as i64)
    .bind(structured.as_ref().map(|s| tenet_list_json(&s.strengths)))
    .bind(structured.as_ref().map(|s| tenet_list_json(&s.improvements)))
    .bind(structured.as_ref().and_then(|s| s.strengths_text.clone()))
    .bind(structured.as_ref().and_then(|s| s.improvements_text.clone()))
    .bind(&hash)
    .execute(db)
    .await?;

    report.workday_rows += result.rows_affected();
    Ok(())
}

async fn seed_workday_feedback(
    db: &SqlitePool,
    catalog: &TenetCatalog,
    report: &mut SampleReport,
) -> Result<()> {
    // Structured rows for the first few members, from colleagues
    // outside the orgchart.
    for (i, (_, member_name, _)) in TEAM.iter().take(4).enumerate() {
        let strengths = pick_tenets(catalog, i + 1, 3, &[]);
        let improvements = pick_tenets(catalog, i + 5, 2, &strengths);
        let raw_text = format!(
            "[TENETS] Strengths: {} Improvements: {} [/TENETS]\n\
             Strengths: Dependable partner on cross-team work.\n\
             Areas for Improvement: Could raise risks a little earlier.",
            strengths.join(", "),
            improvements.join(", ")
        );
        insert_workday_row(db, member_name, "Izzy External", &raw_text, 20 + i as i64, report)
            .await?;
    }

    // Generic rows, including one for a person not in the orgchart at all.
    for (i, (_, member_name, _)) in TEAM.iter().take(2).enumerate() {
        insert_workday_row(
            db,
            member_name,
            "Randy Reviewer",
            GENERIC_COMMENTS[i % GENERIC_COMMENTS.len()],
            45 + i as i64,
            report,
        )
        .await?;
    }
    insert_workday_row(
        db,
        "Wanda External",
        "Randy Reviewer",
        GENERIC_COMMENTS[2],
        60,
        report,
    )
    .await?;

    Ok(())
}

/// Seed demo data. Refuses to touch a non-empty database unless `force`.
pub async fn generate_sample_data(
    db: &SqlitePool,
    catalog: &TenetCatalog,
    force: bool,
) -> Result<SampleReport> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons")
        .fetch_one(db)
        .await?;
    if existing > 0 {
        if !force {
            bail!("Database already contains {} people; pass --force to overwrite", existing);
        }
        clear_all(db).await?;
    }

    let mut report = SampleReport::default();
    seed_people(db, &mut report).await?;
    seed_peer_feedback(db, catalog, &mut report).await?;
    seed_manager_feedback(db, catalog, &mut report).await?;
    seed_workday_feedback(db, catalog, &mut report).await?;

    Ok(report)
}
