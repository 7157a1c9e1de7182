//! How often known-mutation and known-optimization variants land in the
//! region a surface metric should get wrong.

use serde::{Deserialize, Serialize};

use crate::analysis::regions::{classify, Region, VariantKind};
use crate::core::config::RegionThresholds;
use crate::io::records::{first_f64, Record};

/// Fields read for SurfaceSim, in order; `SurfaceSim` is what batch scoring writes
pub const SURFACE_FIELDS: [&str; 3] = ["surface_similarity", "surfaceSim", "SurfaceSim"];
/// Fields read for the semantic score, in order
pub const SEMANTIC_FIELDS: [&str; 2] = ["df_score", "score"];

/// Hit-rate counts for one threshold setting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRate {
    /// Thresholds used
    pub thresholds: RegionThresholds,
    /// Rows with finite x and y
    pub rows: usize,
    /// Mutation rows
    pub total_mutations: usize,
    /// Optimization rows
    pub total_optimizations: usize,
    /// Mutation rows classified SFD
    pub mutations_in_sfd: usize,
    /// Optimization rows classified DFS
    pub optimizations_in_dfs: usize,
}

impl HitRate {
    /// Share of mutations in SFD, in percent
    pub fn mutation_pct(&self) -> Option<f64> {
        percentage(self.mutations_in_sfd, self.total_mutations)
    }

    /// Share of optimizations in DFS, in percent
    pub fn optimization_pct(&self) -> Option<f64> {
        percentage(self.optimizations_in_dfs, self.total_optimizations)
    }
}

fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| 100.0 * part as f64 / whole as f64)
}

/// Tally hit rates over records.
///
/// Rows without a finite SurfaceSim or semantic score are skipped.
pub fn hit_rate(records: &[Record], thresholds: &RegionThresholds) -> HitRate {
    let mut result = HitRate {
        thresholds: *thresholds,
        rows: 0,
        total_mutations: 0,
        total_optimizations: 0,
        mutations_in_sfd: 0,
        optimizations_in_dfs: 0,
    };

    for record in records {
        let (Some(x), Some(y)) = (
            first_f64(record, &SURFACE_FIELDS),
            first_f64(record, &SEMANTIC_FIELDS),
        ) else {
            continue;
        };
        result.rows += 1;

        let region = classify(x, y, thresholds);
        match VariantKind::detect(record) {
            VariantKind::Mutation => {
                result.total_mutations += 1;
                if region == Region::Sfd {
                    result.mutations_in_sfd += 1;
                }
            }
            VariantKind::Optimization => {
                result.total_optimizations += 1;
                if region == Region::Dfs {
                    result.optimizations_in_dfs += 1;
                }
            }
            VariantKind::Other => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_hit_rate_counts() {
        let rows = records(vec![
            json!({"variant_id": "MUT1", "surfaceSim": 0.95, "score": 0.0}),
            json!({"variant_id": "MUT2", "surfaceSim": 0.50, "score": 0.0}),
            json!({"variant_id": "OPT1", "surface_similarity": 0.30, "df_score": 1.0}),
            json!({"variant_id": "OPT2", "surfaceSim": 0.95, "score": 1.0}),
            json!({"variant_id": "X", "surfaceSim": 0.30, "score": 1.0}),
            json!({"variant_id": "MUT3", "surfaceSim": "n/a", "score": 0.0}),
        ]);
        let result = hit_rate(&rows, &RegionThresholds::default());
        assert_eq!(result.rows, 5);
        assert_eq!(result.total_mutations, 2);
        assert_eq!(result.mutations_in_sfd, 1);
        assert_eq!(result.total_optimizations, 2);
        assert_eq!(result.optimizations_in_dfs, 1);
        assert_eq!(result.mutation_pct(), Some(50.0));
        assert_eq!(result.optimization_pct(), Some(50.0));
    }

    #[test]
    fn test_semantic_field_precedence() {
        // df_score is read before score
        let rows = records(vec![json!({
            "variant_id": "OPT1", "surfaceSim": 0.2, "df_score": 1.0, "score": 0.0
        })]);
        assert_eq!(hit_rate(&rows, &RegionThresholds::default()).optimizations_in_dfs, 1);
    }

    #[test]
    fn test_reads_batch_output_key() {
        let rows = records(vec![json!({"variant_id": "MUT1", "SurfaceSim": 0.97, "score": 0.0})]);
        let result = hit_rate(&rows, &RegionThresholds::default());
        assert_eq!(result.rows, 1);
        assert_eq!(result.mutations_in_sfd, 1);
    }

    #[test]
    fn test_empty_totals_have_no_percentage() {
        let result = hit_rate(&[], &RegionThresholds::default());
        assert_eq!(result.mutation_pct(), None);
        assert_eq!(result.optimization_pct(), None);
    }
}
