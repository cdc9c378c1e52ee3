//! Integration tests for the Workday XLSX import
//!
//! Spreadsheets are built in-memory with `rust_xlsxwriter` and fed
//! straight into the importer, mirroring the upload path without HTTP.

use rust_xlsxwriter::Workbook;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use tfb_ui::import::workday::import_workday_xlsx;

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    tfb_common::db::init_tables(&pool)
        .await
        .expect("Should create tables");
    pool
}

const HEADERS: &[&str] = &[
    "About", "From", "Question", "Feedback", "Asked By", "Type", "Date",
];

/// Build an export-shaped workbook: title in row 1, headers in row 2,
/// data from row 3, matching the layout Workday produces.
fn build_xlsx(sheet_name: &str, rows: &[[&str; 7]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).expect("Should name sheet");

    worksheet
        .write_string(0, 0, "Feedback Export")
        .expect("Should write title");
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string(1, col as u16, *header)
            .expect("Should write header");
    }
    for (i, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet
                    .write_string(2 + i as u32, col as u16, *value)
                    .expect("Should write cell");
            }
        }
    }

    workbook.save_to_buffer().expect("Should serialize workbook")
}

const STRUCTURED_TEXT: &str = "[TENETS] Strengths: ownership, quality, collaboration \
     Improvements: communication, innovation [/TENETS]\n\
     Strengths: Sees tricky migrations through.\n\
     Areas for Improvement: Share status earlier.";

fn sample_rows() -> Vec<[&'static str; 7]> {
    vec![
        [
            "Alice Anvil",
            "Randy Reviewer",
            "What feedback do you have?",
            STRUCTURED_TEXT,
            "Alice Anvil",
            "Requested by Self",
            "2026-03-14 09:30:00",
        ],
        [
            "Alice Anvil",
            "Paula Peer",
            "What feedback do you have?",
            "Great incident response this quarter.",
            "Della Gate",
            "Requested by Others",
            "2026-02-01 12:00:00",
        ],
        [
            "Bob Breaker",
            "Randy Reviewer",
            "What feedback do you have?",
            "Solid release work.",
            "Bob Breaker",
            "Requested by Self",
            "2026-01-20 08:00:00",
        ],
    ]
}

#[tokio::test]
async fn import_classifies_structured_and_generic_rows() {
    let db = setup_test_db().await;
    let bytes = build_xlsx("Feedback", &sample_rows());

    let report = import_workday_xlsx(&db, &bytes).await;
    assert!(report.success(), "errors: {:?}", report.errors);
    assert_eq!(report.imported, 3);
    assert_eq!(report.structured_count, 1);
    assert_eq!(report.generic_count, 2);
    assert_eq!(report.skipped_duplicates, 0);

    let (strengths, date): (String, String) = sqlx::query_as(
        "SELECT strengths, date FROM workday_feedback WHERE is_structured = 1",
    )
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(strengths, r#"["ownership","quality","collaboration"]"#);
    assert_eq!(date, "2026-03-14T09:30:00");
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let db = setup_test_db().await;
    let bytes = build_xlsx("Feedback", &sample_rows());

    let first = import_workday_xlsx(&db, &bytes).await;
    assert_eq!(first.imported, 3);

    let second = import_workday_xlsx(&db, &bytes).await;
    assert!(second.success());
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped_duplicates, 3);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workday_feedback")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn rows_without_provider_are_skipped_with_warning() {
    let db = setup_test_db().await;
    let mut rows = sample_rows();
    // Pending request: recipient known, no provider or response yet.
    rows.push(["Carol Console", "", "", "", "", "", ""]);
    let bytes = build_xlsx("Feedback", &rows);

    let report = import_workday_xlsx(&db, &bytes).await;
    assert!(report.success());
    assert_eq!(report.imported, 3);
    assert_eq!(report.skipped_empty, 1);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("Skipped 1 empty/incomplete rows")));
}

#[tokio::test]
async fn row_without_recipient_warns_with_provider_name() {
    let db = setup_test_db().await;
    let mut rows = sample_rows();
    // Provider present, recipient cell blank: malformed, not pending.
    rows.push(["", "Paula Peer", "", "Ghost feedback", "", "", ""]);
    let bytes = build_xlsx("Feedback", &rows);

    let report = import_workday_xlsx(&db, &bytes).await;
    assert!(report.success());
    assert_eq!(report.imported, 3);
    assert_eq!(report.skipped_empty, 0);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("from 'Paula Peer' has no recipient")));
}

#[tokio::test]
async fn inconsistent_request_type_is_an_error() {
    let db = setup_test_db().await;
    let rows = vec![[
        "Alice Anvil",
        "Paula Peer",
        "What feedback do you have?",
        "Nice work.",
        // Asked by the recipient herself, but typed as a request by others.
        "Alice Anvil",
        "Requested by Others",
        "2026-02-01 12:00:00",
    ]];
    let bytes = build_xlsx("Feedback", &rows);

    let report = import_workday_xlsx(&db, &bytes).await;
    assert!(!report.success());
    assert_eq!(report.imported, 0);
    assert!(report.errors[0].contains("Data inconsistency"));
}

#[tokio::test]
async fn falls_back_to_first_sheet_with_warning() {
    let db = setup_test_db().await;
    let bytes = build_xlsx("Sheet1", &sample_rows());

    let report = import_workday_xlsx(&db, &bytes).await;
    assert!(report.success());
    assert_eq!(report.imported, 3);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("No 'Feedback' sheet found")));
}

#[tokio::test]
async fn unreadable_file_fails_cleanly() {
    let db = setup_test_db().await;

    let report = import_workday_xlsx(&db, b"this is not a spreadsheet").await;
    assert!(!report.success());
    assert_eq!(report.imported, 0);
    assert!(report.errors[0].contains("Failed to open XLSX file"));
}
