//! UI serving routes
//!
//! Serves the static HTML pages; all data comes from the JSON API.

use axum::{response::Html, routing::get, Router};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../../ui/index.html");
const INDIVIDUAL_HTML: &str = include_str!("../../ui/individual.html");
const MANAGER_HTML: &str = include_str!("../../ui/manager.html");
const REPORT_HTML: &str = include_str!("../../ui/report.html");

/// GET /
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /individual
pub async fn serve_individual() -> Html<&'static str> {
    Html(INDIVIDUAL_HTML)
}

/// GET /manager
pub async fn serve_manager() -> Html<&'static str> {
    Html(MANAGER_HTML)
}

/// GET /report
pub async fn serve_report() -> Html<&'static str> {
    Html(REPORT_HTML)
}

pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_index))
        .route("/individual", get(serve_individual))
        .route("/manager", get(serve_manager))
        .route("/report", get(serve_report))
}
