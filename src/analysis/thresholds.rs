//! Grid search for region boundaries.
//!
//! A good boundary setting is one where the learned and lexical metrics err
//! more in the corner regions than in the control region. Each candidate is
//! scored by the average, over metrics, of the MAE gap between each corner
//! and control.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::regions::{classify, DataSource, Region, RegionCounts};
use crate::core::config::{RegionThresholds, ThresholdSearchConfig};
use crate::core::errors::{Result, SurfaceSimError};
use crate::io::records::{first_f64, Record};

/// Per-metric errors at one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricGap {
    /// Metric field name
    pub metric: String,
    /// MAE against the semantic score in DFS
    pub mae_dfs: Option<f64>,
    /// MAE in SFD
    pub mae_sfd: Option<f64>,
    /// MAE in Control
    pub mae_control: Option<f64>,
    /// `mae_dfs - mae_control`
    pub gap_dfs: Option<f64>,
    /// `mae_sfd - mae_control`
    pub gap_sfd: Option<f64>,
    /// Mean of the available gaps
    pub contribution: Option<f64>,
}

/// One boundary setting that passed the sample-size guards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCandidate {
    /// The boundaries
    pub thresholds: RegionThresholds,
    /// Mean contribution over metrics that had one
    pub objective: f64,
    /// Metrics that contributed
    pub metrics_used: usize,
    /// Region counts over all rows
    pub counts: RegionCounts,
    /// Per-metric detail
    pub per_metric: Vec<MetricGap>,
    /// Region counts split by data source
    pub by_source: BTreeMap<DataSource, RegionCounts>,
}

/// Result of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearchReport {
    /// Rows with finite x and y
    pub rows: usize,
    /// Metrics with at least one finite value
    pub metrics: Vec<String>,
    /// Grid points with lo < hi on both axes
    pub evaluated: usize,
    /// Grid points that passed the guards
    pub accepted: usize,
    /// Best candidates, objective descending
    pub top: Vec<ThresholdCandidate>,
}

impl ThresholdSearchReport {
    /// Highest-objective candidate
    pub fn best(&self) -> Option<&ThresholdCandidate> {
        self.top.first()
    }
}

struct SearchRow {
    x: f64,
    y: f64,
    source: DataSource,
    metric_values: Vec<Option<f64>>,
}

/// Run the grid search.
///
/// Fails with a validation error when there are no usable rows, no metric
/// has any values, or no candidate meets the minimum region counts.
pub fn search_thresholds(
    records: &[Record],
    config: &ThresholdSearchConfig,
) -> Result<ThresholdSearchReport> {
    config.validate()?;

    let mut rows: Vec<SearchRow> = records
        .iter()
        .filter_map(|record| {
            let x = first_f64(record, &config.surface_fields)?;
            let y = first_f64(record, &[config.semantic_field.as_str()])?;
            let metric_values = config
                .metrics
                .iter()
                .map(|metric| first_f64(record, &[metric.as_str()]))
                .collect();
            Some(SearchRow {
                x,
                y,
                source: DataSource::infer(record),
                metric_values,
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(SurfaceSimError::validation_field(
            format!(
                "no rows with finite {} and '{}'",
                config.surface_fields.join("/"), config.semantic_field
            ),
            "threshold_search",
        ));
    }

    // keep only metrics present somewhere
    let present: Vec<usize> = (0..config.metrics.len())
        .filter(|&m| rows.iter().any(|row| row.metric_values[m].is_some()))
        .collect();
    if present.is_empty() {
        return Err(SurfaceSimError::validation_field(
            "none of the configured metrics has a value in any row",
            "threshold_search.metrics",
        ));
    }
    let metrics: Vec<String> = present.iter().map(|&m| config.metrics[m].clone()).collect();
    for row in &mut rows {
        row.metric_values = present.iter().map(|&m| row.metric_values[m]).collect();
    }

    let grid = candidate_grid(config);
    info!(
        rows = rows.len(),
        metrics = metrics.len(),
        candidates = grid.len(),
        "threshold search started"
    );

    let mut accepted = evaluate_grid(&grid, &rows, &metrics, config);
    let accepted_count = accepted.len();
    if accepted.is_empty() {
        return Err(SurfaceSimError::validation_field(
            "no candidate met the minimum region counts; relax the minimums or widen the ranges",
            "threshold_search",
        ));
    }

    // stable sort: ties keep grid order
    accepted.sort_by(|a, b| b.objective.total_cmp(&a.objective));
    accepted.truncate(config.top_k.max(1));

    info!(accepted = accepted_count, "threshold search finished");
    Ok(ThresholdSearchReport {
        rows: rows.len(),
        metrics,
        evaluated: grid.len(),
        accepted: accepted_count,
        top: accepted,
    })
}

/// Grid points in nested `x_lo, x_hi, y_lo, y_hi` order, skipping hi <= lo.
pub fn candidate_grid(config: &ThresholdSearchConfig) -> Vec<RegionThresholds> {
    let x_los = config.x_lo.values(config.step);
    let x_his = config.x_hi.values(config.step);
    let y_los = config.y_lo.values(config.step);
    let y_his = config.y_hi.values(config.step);

    let mut grid = Vec::new();
    for &x_lo in &x_los {
        for &x_hi in &x_his {
            if x_hi <= x_lo {
                continue;
            }
            for &y_lo in &y_los {
                for &y_hi in &y_his {
                    if y_hi <= y_lo {
                        continue;
                    }
                    grid.push(RegionThresholds {
                        x_lo,
                        x_hi,
                        y_lo,
                        y_hi,
                    });
                }
            }
        }
    }
    grid
}

#[cfg(feature = "parallel")]
fn evaluate_grid(
    grid: &[RegionThresholds],
    rows: &[SearchRow],
    metrics: &[String],
    config: &ThresholdSearchConfig,
) -> Vec<ThresholdCandidate> {
    use rayon::prelude::*;

    grid.par_iter()
        .filter_map(|thresholds| evaluate_candidate(thresholds, rows, metrics, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_grid(
    grid: &[RegionThresholds],
    rows: &[SearchRow],
    metrics: &[String],
    config: &ThresholdSearchConfig,
) -> Vec<ThresholdCandidate> {
    grid.iter()
        .filter_map(|thresholds| evaluate_candidate(thresholds, rows, metrics, config))
        .collect()
}

#[derive(Clone, Copy, Default)]
struct ErrorSum {
    sum: f64,
    count: usize,
}

impl ErrorSum {
    fn add(&mut self, error: f64) {
        self.sum += error;
        self.count += 1;
    }

    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn region_slot(region: Region) -> usize {
    match region {
        Region::Dfs => 0,
        Region::Sfd => 1,
        Region::Control => 2,
    }
}

fn evaluate_candidate(
    thresholds: &RegionThresholds,
    rows: &[SearchRow],
    metrics: &[String],
    config: &ThresholdSearchConfig,
) -> Option<ThresholdCandidate> {
    let mut counts = RegionCounts::default();
    let mut by_source: BTreeMap<DataSource, RegionCounts> = BTreeMap::new();
    let mut errors = vec![[ErrorSum::default(); 3]; metrics.len()];

    for row in rows {
        let region = classify(row.x, row.y, thresholds);
        counts.add(region);
        by_source.entry(row.source).or_default().add(region);

        let slot = region_slot(region);
        for (m, value) in row.metric_values.iter().enumerate() {
            if let Some(value) = value {
                errors[m][slot].add((row.y - value).abs());
            }
        }
    }

    if counts.dfs < config.min_dfs || counts.sfd < config.min_sfd || counts.control < config.min_control {
        return None;
    }

    let per_metric: Vec<MetricGap> = metrics
        .iter()
        .zip(&errors)
        .map(|(metric, sums)| {
            let mae_dfs = sums[0].mean();
            let mae_sfd = sums[1].mean();
            let mae_control = sums[2].mean();
            let gap_dfs = mae_dfs.zip(mae_control).map(|(d, c)| d - c);
            let gap_sfd = mae_sfd.zip(mae_control).map(|(s, c)| s - c);
            let gaps: Vec<f64> = [gap_dfs, gap_sfd].into_iter().flatten().collect();
            let contribution = (!gaps.is_empty()).then(|| gaps.iter().sum::<f64>() / gaps.len() as f64);
            MetricGap {
                metric: metric.clone(),
                mae_dfs,
                mae_sfd,
                mae_control,
                gap_dfs,
                gap_sfd,
                contribution,
            }
        })
        .collect();

    let contributions: Vec<f64> = per_metric.iter().filter_map(|gap| gap.contribution).collect();
    if contributions.is_empty() {
        debug!(?thresholds, "candidate has no metric contributions");
        return None;
    }

    Some(ThresholdCandidate {
        thresholds: *thresholds,
        objective: contributions.iter().sum::<f64>() / contributions.len() as f64,
        metrics_used: contributions.len(),
        counts,
        per_metric,
        by_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ThresholdRange;
    use approx::assert_relative_eq;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    /// Rows in three clusters: DFS corner, SFD corner and the middle.
    /// The metric tracks surfaceSim, so it errs in the corners only.
    fn clustered_rows() -> Vec<Record> {
        let mut rows = Vec::new();
        for i in 0..4 {
            rows.push(record(json!({"id": format!("SHARE-{i}"), "surfaceSim": 0.2, "score": 1.0, "codebleu": 0.2})));
            rows.push(record(json!({"id": format!("LOCAL-{i}"), "surfaceSim": 0.95, "score": 0.0, "codebleu": 0.95})));
        }
        for i in 0..6 {
            rows.push(record(json!({"id": format!("B-{i}"), "surfaceSim": 0.5, "score": 0.5, "codebleu": 0.5})));
        }
        rows
    }

    fn small_config() -> ThresholdSearchConfig {
        ThresholdSearchConfig {
            step: 0.1,
            x_lo: ThresholdRange::new(0.3, 0.4),
            x_hi: ThresholdRange::new(0.8, 0.9),
            y_lo: ThresholdRange::new(0.1, 0.1),
            y_hi: ThresholdRange::new(0.9, 0.9),
            min_dfs: 4,
            min_sfd: 4,
            min_control: 6,
            metrics: vec!["codebleu".to_string(), "codescore".to_string()],
            top_k: 3,
            ..ThresholdSearchConfig::default()
        }
    }

    #[test]
    fn test_default_grid_skips_inverted_bounds() {
        let grid = candidate_grid(&ThresholdSearchConfig::default());
        assert!(!grid.is_empty());
        assert!(grid.iter().all(|t| t.x_lo < t.x_hi && t.y_lo < t.y_hi));
        assert_eq!(grid[0], RegionThresholds { x_lo: 0.10, x_hi: 0.40, y_lo: 0.10, y_hi: 0.40 });
    }

    #[test]
    fn test_search_finds_positive_gap() {
        let report = search_thresholds(&clustered_rows(), &small_config()).unwrap();
        assert_eq!(report.rows, 14);
        // codescore has no values and is dropped
        assert_eq!(report.metrics, vec!["codebleu".to_string()]);
        assert_eq!(report.evaluated, 4);
        assert_eq!(report.accepted, 4);
        assert_eq!(report.top.len(), 3);

        let best = report.best().unwrap();
        assert_eq!(best.counts, RegionCounts { dfs: 4, sfd: 4, control: 6 });
        assert_relative_eq!(best.per_metric[0].mae_dfs.unwrap(), 0.8);
        assert_relative_eq!(best.per_metric[0].mae_sfd.unwrap(), 0.95);
        assert_relative_eq!(best.per_metric[0].mae_control.unwrap(), 0.0);
        assert_relative_eq!(best.objective, 0.875);
        assert_eq!(best.metrics_used, 1);
        // every candidate classifies the clusters identically, so grid order wins
        assert_eq!(best.thresholds.x_lo, 0.3);
        assert_eq!(best.thresholds.x_hi, 0.8);
    }

    #[test]
    fn test_per_source_counts() {
        let report = search_thresholds(&clustered_rows(), &small_config()).unwrap();
        let by_source = &report.best().unwrap().by_source;
        assert_eq!(by_source[&DataSource::Sharecode].dfs, 4);
        assert_eq!(by_source[&DataSource::Local].sfd, 4);
        assert_eq!(by_source[&DataSource::Baseline].control, 6);
    }

    #[test]
    fn test_guards_reject_everything() {
        let config = ThresholdSearchConfig {
            min_control: 100,
            ..small_config()
        };
        let err = search_thresholds(&clustered_rows(), &config).unwrap_err();
        assert!(matches!(err, SurfaceSimError::Validation { .. }));
    }

    #[test]
    fn test_falls_back_to_batch_output_key() {
        let rows: Vec<Record> = clustered_rows()
            .into_iter()
            .map(|mut row| {
                if let Some(x) = row.remove("surfaceSim") {
                    row.insert("SurfaceSim".to_string(), x);
                }
                row
            })
            .collect();
        let report = search_thresholds(&rows, &small_config()).unwrap();
        assert_eq!(report.rows, 14);
        assert_relative_eq!(report.best().unwrap().objective, 0.875);
    }

    #[test]
    fn test_no_usable_rows() {
        let rows = vec![record(json!({"surfaceSim": "x", "score": 1.0}))];
        assert!(search_thresholds(&rows, &small_config()).is_err());
    }
}
