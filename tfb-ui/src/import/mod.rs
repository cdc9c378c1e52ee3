//! Import pipelines for externally authored files
//!
//! - `orgchart`: person directory CSV (upserts, never touches feedback)
//! - `peer_csv`: peer-feedback exchange CSV
//! - `workday`: Workday XLSX export with structured/generic
//!   classification and content-hash deduplication

pub mod orgchart;
pub mod peer_csv;
pub mod workday;
