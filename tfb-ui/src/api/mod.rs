//! HTTP API handlers for tfb-ui
//!
//! JSON endpoints consumed by the static front end, plus the static
//! page routes themselves. All mutating endpoints answer with the
//! `{"success": true, ...}` shape the auto-save scripts expect.

pub mod export;
pub mod feedback;
pub mod health;
pub mod identity;
pub mod manager;
pub mod people;
pub mod report;
pub mod ui;
pub mod workday;
