//! Regions of the (SurfaceSim, semantic score) plane.
//!
//! x is SurfaceSim and y is the ground-truth semantic score. The two corner
//! regions are where surface metrics are expected to mislead:
//! DFS (different form, same semantics) top-left and SFD (same form,
//! different semantics) bottom-right.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::RegionThresholds;
use crate::io::records::Record;

/// Region of one scored pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Different form, same semantics
    #[serde(rename = "DFS")]
    Dfs,
    /// Same form, different semantics
    #[serde(rename = "SFD")]
    Sfd,
    /// Everything else
    Control,
}

impl Region {
    /// Short label used in reports
    pub fn label(self) -> &'static str {
        match self {
            Region::Dfs => "DFS",
            Region::Sfd => "SFD",
            Region::Control => "Control",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a point. Boundaries are inclusive on the corner side.
pub fn classify(x: f64, y: f64, thresholds: &RegionThresholds) -> Region {
    if x <= thresholds.x_lo && y >= thresholds.y_hi {
        Region::Dfs
    } else if x >= thresholds.x_hi && y <= thresholds.y_lo {
        Region::Sfd
    } else {
        Region::Control
    }
}

/// Per-region tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCounts {
    /// Rows in DFS
    pub dfs: usize,
    /// Rows in SFD
    pub sfd: usize,
    /// Rows in Control
    pub control: usize,
}

impl RegionCounts {
    /// Count one row
    pub fn add(&mut self, region: Region) {
        match region {
            Region::Dfs => self.dfs += 1,
            Region::Sfd => self.sfd += 1,
            Region::Control => self.control += 1,
        }
    }

    /// All rows counted
    pub fn total(&self) -> usize {
        self.dfs + self.sfd + self.control
    }
}

/// How a variant was produced from its original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantKind {
    /// Semantics-changing edit
    Mutation,
    /// Semantics-preserving rewrite
    Optimization,
    /// Neither
    Other,
}

impl VariantKind {
    /// Read `variant_type` / `variant_id` from a record
    pub fn detect(record: &Record) -> Self {
        let variant_type = field_text(record, "variant_type").to_lowercase();
        let variant_id = field_text(record, "variant_id").to_uppercase();

        if variant_type.contains("mutation") || variant_id.starts_with("MUT") {
            VariantKind::Mutation
        } else if variant_type.contains("optimization") || variant_id.starts_with("OP") {
            // "OP" also covers "OPT"
            VariantKind::Optimization
        } else {
            VariantKind::Other
        }
    }
}

/// Dataset a row came from, inferred from its id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Ids starting with `SHARE`
    Sharecode,
    /// Ids starting with `LOCAL`
    Local,
    /// Anything else
    Baseline,
}

impl DataSource {
    /// Infer from the record's `id` field
    pub fn infer(record: &Record) -> Self {
        let id = field_text(record, "id");
        if id.starts_with("SHARE") {
            DataSource::Sharecode
        } else if id.starts_with("LOCAL") {
            DataSource::Local
        } else {
            DataSource::Baseline
        }
    }

    /// Lowercase label
    pub fn label(self) -> &'static str {
        match self {
            DataSource::Sharecode => "sharecode",
            DataSource::Local => "local",
            DataSource::Baseline => "baseline",
        }
    }
}

fn field_text(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
