//! Tenet catalog
//!
//! Tenets are the named organizational values feedback is categorized
//! against. The catalog is externally authored JSON: an org-specific
//! `tenets.json` in the data folder, falling back to the bundled
//! `tenets-sample.json`. Catalog order is the canonical display and
//! tie-break order everywhere counts are presented.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bundled sample catalog used when no org-specific file exists.
pub const SAMPLE_TENETS_JSON: &str = include_str!("../tenets-sample.json");

/// A single organizational tenet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inactive tenets are retired from forms and reports but keep
    /// their historical ids valid.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TenetFile {
    tenets: Vec<Tenet>,
}

/// Ordered catalog of active tenets
#[derive(Debug, Clone)]
pub struct TenetCatalog {
    tenets: Vec<Tenet>,
}

impl TenetCatalog {
    /// Load from `path` if it exists, otherwise the bundled sample.
    pub fn load(path: &Path) -> Result<TenetCatalog> {
        let contents = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            SAMPLE_TENETS_JSON.to_string()
        };
        Self::from_json(&contents)
    }

    /// Parse a catalog file, keeping only active tenets in file order.
    pub fn from_json(contents: &str) -> Result<TenetCatalog> {
        let file: TenetFile = serde_json::from_str(contents)
            .map_err(|e| Error::Config(format!("Invalid tenet catalog: {}", e)))?;
        let tenets: Vec<Tenet> = file.tenets.into_iter().filter(|t| t.active).collect();
        if tenets.is_empty() {
            return Err(Error::Config("Tenet catalog has no active tenets".to_string()));
        }
        Ok(TenetCatalog { tenets })
    }

    /// Active tenets in catalog order.
    pub fn tenets(&self) -> &[Tenet] {
        &self.tenets
    }

    pub fn contains(&self, tenet_id: &str) -> bool {
        self.tenets.iter().any(|t| t.id == tenet_id)
    }

    pub fn name_of(&self, tenet_id: &str) -> Option<&str> {
        self.tenets
            .iter()
            .find(|t| t.id == tenet_id)
            .map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_parses() {
        let catalog = TenetCatalog::from_json(SAMPLE_TENETS_JSON).unwrap();
        assert!(!catalog.tenets().is_empty());
        assert!(catalog.contains("ownership"));
    }

    #[test]
    fn inactive_tenets_are_filtered() {
        let json = r#"{"tenets": [
            {"id": "a", "name": "A"},
            {"id": "b", "name": "B", "active": false},
            {"id": "c", "name": "C", "active": true}
        ]}"#;
        let catalog = TenetCatalog::from_json(json).unwrap();
        let ids: Vec<&str> = catalog.tenets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn catalog_order_is_file_order() {
        let json = r#"{"tenets": [
            {"id": "z", "name": "Z"},
            {"id": "a", "name": "A"}
        ]}"#;
        let catalog = TenetCatalog::from_json(json).unwrap();
        assert_eq!(catalog.tenets()[0].id, "z");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(TenetCatalog::from_json(r#"{"tenets": []}"#).is_err());
        assert!(TenetCatalog::from_json("not json").is_err());
    }
}
