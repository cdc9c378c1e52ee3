//! tfb-ui library - Team Feedback Tool web service
//!
//! Exposes the application state and router for integration testing.

pub mod aggregate;
pub mod api;
pub mod error;
pub mod import;
pub mod pdf;
pub mod sample;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tfb_common::TenetCatalog;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Active tenet catalog in display order
    pub catalog: Arc<TenetCatalog>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, catalog: TenetCatalog) -> Self {
        Self {
            db,
            catalog: Arc::new(catalog),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (static HTML pages)
        .merge(api::ui::ui_routes())
        // JSON API routes
        .merge(api::health::health_routes())
        .merge(api::identity::identity_routes())
        .merge(api::people::people_routes())
        .merge(api::feedback::feedback_routes())
        .merge(api::manager::manager_routes())
        .merge(api::workday::workday_routes())
        .merge(api::report::report_routes())
        .merge(api::export::export_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
