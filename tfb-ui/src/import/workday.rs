//! Workday XLSX feedback import
//!
//! Parses the "Feedback on My Team" export. Each row is classified as
//! *structured* (tool-assisted, carries a `[TENETS]` marker block) or
//! *generic* (free text from other Workday workflows); only structured
//! rows feed the tenet aggregation. A SHA-256 content hash over the
//! recipient, provider and raw text deduplicates re-imports: importing
//! the same file twice inserts nothing.

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::io::Cursor;

/// Header row of the export (1-based). Workday puts a title in row 1.
const DEFAULT_HEADER_ROW: usize = 2;

const REQUEST_TYPE_SELF: &str = "Requested by Self";
const REQUEST_TYPE_OTHERS: &str = "Requested by Others";

/// Marker block embedded by the feedback form:
/// `[TENETS] Strengths: a, b, c Improvements: d, e [/TENETS]`
static TENET_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[TENETS\]\s*Strengths:\s*([^\n]*)\s*Improvements:\s*([^\n]*)\s*\[/TENETS\]")
        .expect("tenet marker pattern")
});

static STRENGTHS_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Strengths?:\s*(.*?)(?:Areas?\s+for\s+Improvement|\z)")
        .expect("strengths text pattern")
});

static IMPROVEMENTS_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Areas?\s+for\s+Improvement:\s*(.*)").expect("improvements text pattern")
});

/// Result of an XLSX import operation.
///
/// Row-level problems are counted and summarized; only file-level
/// problems (unreadable workbook, missing required columns) make the
/// whole import fail.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub imported: u64,
    pub skipped_duplicates: u64,
    pub skipped_empty: u64,
    pub structured_count: u64,
    pub generic_count: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success(),
            "imported": self.imported,
            "skipped_duplicates": self.skipped_duplicates,
            "skipped_empty": self.skipped_empty,
            "structured_count": self.structured_count,
            "generic_count": self.generic_count,
            "warnings": self.warnings,
            "errors": self.errors,
        })
    }
}

/// Structured tenet content parsed out of a marker block
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredContent {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub strengths_text: Option<String>,
    pub improvements_text: Option<String>,
}

/// Dedup key: hex SHA-256 over recipient, provider and raw text.
pub fn content_hash(about: &str, from_name: &str, raw_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(about.as_bytes());
    hasher.update(b"\n");
    hasher.update(from_name.as_bytes());
    hasher.update(b"\n");
    hasher.update(raw_text.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Parse a feedback cell for the `[TENETS]` marker block.
///
/// Returns `None` for generic feedback. For structured feedback the
/// comma-separated tenet ids are split out, and the free-text sections
/// after the marker (`Strengths:` / `Areas for Improvement:`) are
/// extracted when present.
pub fn parse_structured(text: &str) -> Option<StructuredContent> {
    let captures = TENET_MARKER.captures(text)?;

    let split_ids = |raw: &str| -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    let strengths = split_ids(&captures[1]);
    let improvements = split_ids(&captures[2]);

    let after_marker = text[captures.get(0).expect("whole match").end()..].trim();

    let strengths_text = STRENGTHS_TEXT
        .captures(after_marker)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty());
    let improvements_text = IMPROVEMENTS_TEXT
        .captures(after_marker)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty());

    Some(StructuredContent {
        strengths,
        improvements,
        strengths_text,
        improvements_text,
    })
}

/// Column positions detected from the header row
#[derive(Debug, Default)]
struct ColumnMap {
    about: Option<usize>,
    from_name: Option<usize>,
    question: Option<usize>,
    feedback: Option<usize>,
    asked_by: Option<usize>,
    request_type: Option<usize>,
    date: Option<usize>,
    feedback_also_given_to: Option<usize>,
}

/// Synonyms accepted for each required column, matched case-insensitively.
const COLUMN_SYNONYMS: &[(&str, &[&str])] = &[
    ("about", &["about", "recipient", "employee", "for"]),
    ("from_name", &["from", "provider", "given by", "reviewer"]),
    ("question", &["question"]),
    ("feedback", &["feedback", "response", "answer", "comments"]),
    ("asked_by", &["asked by", "requested by", "requester"]),
    ("request_type", &["type", "request type"]),
    ("date", &["date", "response date", "submitted"]),
];

/// Match one field against the headers: exact match first, then a
/// prefix match that skips photo columns.
fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    for (idx, header) in headers.iter().enumerate() {
        if synonyms.iter().any(|name| *name == header.as_str()) {
            return Some(idx);
        }
    }
    for (idx, header) in headers.iter().enumerate() {
        if header.contains("photo") {
            continue;
        }
        if synonyms.iter().any(|name| header.starts_with(name)) {
            return Some(idx);
        }
    }
    None
}

fn detect_columns(headers: &[String]) -> (ColumnMap, Vec<String>) {
    let mut map = ColumnMap::default();
    let mut warnings = Vec::new();

    for (field, synonyms) in COLUMN_SYNONYMS {
        let found = find_column(headers, synonyms);
        match *field {
            "about" => map.about = found,
            "from_name" => map.from_name = found,
            "question" => map.question = found,
            "feedback" => map.feedback = found,
            "asked_by" => map.asked_by = found,
            "request_type" => map.request_type = found,
            "date" => map.date = found,
            _ => unreachable!(),
        }
    }

    map.feedback_also_given_to = headers
        .iter()
        .position(|h| h.contains("also given to"));

    if map.about.is_none() {
        warnings.push("Could not find 'About'/'Recipient' column - using first non-photo column".to_string());
        map.about = headers
            .iter()
            .position(|h| !h.is_empty() && !h.contains("photo"));
    }
    if map.feedback.is_none() {
        warnings.push("Could not find 'Feedback'/'Response' column".to_string());
    }

    (map, warnings)
}

fn cell_string(row: &[Data], idx: Option<usize>) -> Option<String> {
    let cell = row.get(idx?)?;
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) => None,
    }
}

/// Date cells arrive either as native datetimes or as strings; anything
/// unparseable imports with a null date.
fn cell_date(row: &[Data], idx: Option<usize>) -> Option<NaiveDateTime> {
    let cell = row.get(idx?)?;
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::String(s) => {
            let trimmed = s.trim();
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .or_else(|| {
                    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok(),
        _ => None,
    }
}

/// Import feedback rows from a Workday XLSX export.
pub async fn import_workday_xlsx(db: &SqlitePool, bytes: &[u8]) -> ImportReport {
    let mut report = ImportReport::default();

    let mut workbook: Xlsx<_> = match Xlsx::new(Cursor::new(bytes)) {
        Ok(wb) => wb,
        Err(e) => {
            report.errors.push(format!("Failed to open XLSX file: {}", e));
            return report;
        }
    };

    // Prefer a sheet named like "Feedback"; fall back to the first.
    let sheet_names = workbook.sheet_names().to_owned();
    let sheet_name = match sheet_names
        .iter()
        .find(|name| name.to_lowercase().contains("feedback"))
    {
        Some(name) => name.clone(),
        None => match sheet_names.first() {
            Some(first) => {
                report
                    .warnings
                    .push(format!("No 'Feedback' sheet found, using '{}'", first));
                first.clone()
            }
            None => {
                report.errors.push("Workbook has no sheets".to_string());
                return report;
            }
        },
    };

    let range = match workbook.worksheet_range(&sheet_name) {
        Ok(range) => range,
        Err(e) => {
            report
                .errors
                .push(format!("Failed to read sheet '{}': {}", sheet_name, e));
            return report;
        }
    };

    // The used range may not start at row 1; translate the configured
    // header row into a range-relative index.
    let start_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let header_index = DEFAULT_HEADER_ROW.saturating_sub(1).saturating_sub(start_row);

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.nth(header_index) {
        Some(row) => row
            .iter()
            .map(|cell| match cell {
                Data::String(s) => s.trim().to_lowercase(),
                Data::Empty => String::new(),
                other => other.to_string().trim().to_lowercase(),
            })
            .collect(),
        None => {
            report.errors.push("Spreadsheet has no header row".to_string());
            return report;
        }
    };

    let (columns, column_warnings) = detect_columns(&headers);
    report.warnings.extend(column_warnings);

    if columns.from_name.is_none() {
        report
            .errors
            .push("Cannot import: 'From'/'Provider' column not found in spreadsheet".to_string());
        return report;
    }
    if columns.about.is_none() {
        report
            .errors
            .push("Cannot import: 'About'/'Recipient' column not found in spreadsheet".to_string());
        return report;
    }

    let mut feedback_also_given_to_used = false;
    let mut row_num = DEFAULT_HEADER_ROW.max(start_row + header_index + 1);

    for row in rows {
        row_num += 1;

        if cell_string(row, columns.feedback_also_given_to).is_some() {
            feedback_also_given_to_used = true;
        }

        // Rows without a provider are section headers or pending
        // requests: skip, don't error.
        let Some(from_name) = cell_string(row, columns.from_name) else {
            report.skipped_empty += 1;
            continue;
        };
        // A provider without a recipient is a malformed row, not a
        // pending request; call it out instead of counting it as empty.
        let Some(about) = cell_string(row, columns.about) else {
            report.warnings.push(format!(
                "Row {}: feedback from '{}' has no recipient - skipped",
                row_num, from_name
            ));
            continue;
        };

        let asked_by = cell_string(row, columns.asked_by);
        let request_type = cell_string(row, columns.request_type);

        if let (Some(asked_by), Some(request_type)) = (asked_by.as_deref(), request_type.as_deref())
        {
            if about == asked_by && request_type != REQUEST_TYPE_SELF {
                report.errors.push(format!(
                    "Row {}: Data inconsistency - About '{}' matches Asked By but Type is '{}' (expected '{}')",
                    row_num, about, request_type, REQUEST_TYPE_SELF
                ));
                continue;
            }
            if about != asked_by && request_type != REQUEST_TYPE_OTHERS {
                report.errors.push(format!(
                    "Row {}: Data inconsistency - About '{}' differs from Asked By '{}' but Type is '{}' (expected '{}')",
                    row_num, about, asked_by, request_type, REQUEST_TYPE_OTHERS
                ));
                continue;
            }
        }

        let question = cell_string(row, columns.question);
        let feedback_text = cell_string(row, columns.feedback);
        let date = cell_date(row, columns.date).map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string());

        let raw_text = feedback_text.as_deref().unwrap_or("");
        let hash = content_hash(&about, &from_name, raw_text);

        let structured = feedback_text.as_deref().and_then(parse_structured);

        let insert = sqlx::query(
            r#"
            INSERT OR IGNORE INTO workday_feedback
                (about, from_name, question, feedback, asked_by, request_type, date,
                 is_structured, strengths, improvements, strengths_text, improvements_text,
                 content_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&about)
        .bind(&from_name)
        .bind(&question)
        .bind(&feedback_text)
        .bind(&asked_by)
        .bind(&request_type)
        .bind(&date)
        .bind(structured.is_some() as i64)
        .bind(structured.as_ref().map(|s| tfb_common::db::models::tenet_list_json(&s.strengths)))
        .bind(structured.as_ref().map(|s| tfb_common::db::models::tenet_list_json(&s.improvements)))
        .bind(structured.as_ref().and_then(|s| s.strengths_text.clone()))
        .bind(structured.as_ref().and_then(|s| s.improvements_text.clone()))
        .bind(&hash)
        .execute(db)
        .await;

        match insert {
            Ok(result) if result.rows_affected() == 0 => {
                report.skipped_duplicates += 1;
            }
            Ok(_) => {
                report.imported += 1;
                if structured.is_some() {
                    report.structured_count += 1;
                } else {
                    report.generic_count += 1;
                }
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("Row {}: failed to store feedback: {}", row_num, e));
            }
        }
    }

    if report.skipped_empty > 0 {
        report.warnings.push(format!(
            "Skipped {} empty/incomplete rows (possibly pending feedback requests)",
            report.skipped_empty
        ));
    }
    if feedback_also_given_to_used {
        report.warnings.push(
            "Some entries have 'Feedback Also Given To' values - this column is not currently supported"
                .to_string(),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_feedback_has_no_marker() {
        assert!(parse_structured("Great collaborator, ship more often.").is_none());
    }

    #[test]
    fn structured_feedback_parses_tenet_ids() {
        let text = "[TENETS]\nStrengths: ownership, quality, collaboration\n\
                    Improvements: communication, innovation\n[/TENETS]\n\
                    Strengths: Always sees things through.\n\
                    Areas for Improvement: Share status earlier.";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.strengths, vec!["ownership", "quality", "collaboration"]);
        assert_eq!(parsed.improvements, vec!["communication", "innovation"]);
        assert_eq!(parsed.strengths_text.as_deref(), Some("Always sees things through."));
        assert_eq!(parsed.improvements_text.as_deref(), Some("Share status earlier."));
    }

    #[test]
    fn marker_matching_is_case_insensitive() {
        let text = "[tenets]\nstrengths: ownership\nimprovements: quality, learning\n[/tenets]";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.strengths, vec!["ownership"]);
        assert_eq!(parsed.improvements, vec!["quality", "learning"]);
        assert!(parsed.strengths_text.is_none());
    }

    #[test]
    fn empty_id_segments_are_dropped() {
        let text = "[TENETS]\nStrengths: ownership,, quality ,\nImprovements: \n[/TENETS]";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.strengths, vec!["ownership", "quality"]);
        assert!(parsed.improvements.is_empty());
    }

    #[test]
    fn content_hash_is_deterministic_and_field_sensitive() {
        let a = content_hash("Robin Rollback", "Larry Latency", "solid work");
        let b = content_hash("Robin Rollback", "Larry Latency", "solid work");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        assert_ne!(a, content_hash("Robin Rollback", "Larry Latency", "solid work!"));
        assert_ne!(a, content_hash("Robin Rollback", "Mo Mutex", "solid work"));
    }

    #[test]
    fn hash_separates_field_boundaries() {
        // "ab" + "c" must not collide with "a" + "bc"
        assert_ne!(content_hash("ab", "c", "x"), content_hash("a", "bc", "x"));
    }

    #[test]
    fn column_detection_prefers_exact_matches() {
        let headers: Vec<String> = ["about", "from", "question", "feedback", "asked by", "type", "date"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (map, warnings) = detect_columns(&headers);
        assert!(warnings.is_empty());
        assert_eq!(map.about, Some(0));
        assert_eq!(map.from_name, Some(1));
        assert_eq!(map.request_type, Some(5));
        assert_eq!(map.date, Some(6));
    }

    #[test]
    fn column_detection_skips_photo_columns() {
        let headers: Vec<String> = ["employee photo", "about person", "from person", "feedback given"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (map, _) = detect_columns(&headers);
        assert_eq!(map.about, Some(1));
        assert_eq!(map.from_name, Some(2));
        assert_eq!(map.feedback, Some(3));
    }

    #[test]
    fn missing_feedback_column_warns() {
        let headers: Vec<String> = ["about", "from"].iter().map(|s| s.to_string()).collect();
        let (map, warnings) = detect_columns(&headers);
        assert!(map.feedback.is_none());
        assert!(warnings.iter().any(|w| w.contains("Feedback")));
    }
}
