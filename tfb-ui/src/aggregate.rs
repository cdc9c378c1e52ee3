//! Butterfly chart aggregation
//!
//! Tallies tenet selections across peer feedback, structured imported
//! feedback and the manager's own highlights, then orders tenets for the
//! diverging-bar ("butterfly") presentation. Pure functions: the same
//! inputs always produce the same ordering.

use serde::Serialize;
use std::collections::HashMap;
use tfb_common::TenetCatalog;

/// Per-tenet counts for one butterfly chart row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TenetCount {
    pub id: String,
    pub name: String,
    pub strength_count: i64,
    pub improvement_count: i64,
}

impl TenetCount {
    pub fn net_score(&self) -> i64 {
        self.strength_count - self.improvement_count
    }
}

/// Accumulated tenet tallies for one recipient (or a whole team).
///
/// Every contribution weighs +1 per tenet appearance; the manager's
/// highlighted tenets use the same unit as one peer vote.
#[derive(Debug, Default)]
pub struct TenetTallies {
    strengths: HashMap<String, i64>,
    improvements: HashMap<String, i64>,
}

impl TenetTallies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_strengths<I, S>(&mut self, tenet_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in tenet_ids {
            *self.strengths.entry(id.into()).or_insert(0) += 1;
        }
    }

    pub fn add_improvements<I, S>(&mut self, tenet_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in tenet_ids {
            *self.improvements.entry(id.into()).or_insert(0) += 1;
        }
    }
}

/// Build butterfly chart rows from tallies.
///
/// Emits one row per active catalog tenet (zero counts included),
/// sorted by net score descending. The sort is stable over the catalog
/// order, so ties keep catalog order.
pub fn butterfly_data(catalog: &TenetCatalog, tallies: &TenetTallies) -> Vec<TenetCount> {
    let mut rows: Vec<TenetCount> = catalog
        .tenets()
        .iter()
        .map(|tenet| TenetCount {
            id: tenet.id.clone(),
            name: tenet.name.clone(),
            strength_count: tallies.strengths.get(&tenet.id).copied().unwrap_or(0),
            improvement_count: tallies.improvements.get(&tenet.id).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by_key(|row| std::cmp::Reverse(row.net_score()));
    rows
}
