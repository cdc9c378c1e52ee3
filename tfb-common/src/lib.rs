//! # TFB Common Library
//!
//! Shared code for the Team Feedback Tool:
//! - Database schema, models and queries
//! - Configuration loading and data folder resolution
//! - Tenet catalog
//! - Derived user id helpers

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod tenets;

pub use error::{Error, Result};
pub use tenets::{Tenet, TenetCatalog};
