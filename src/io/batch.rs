//! Batch scoring over JSON records.
//!
//! Every record is scored independently with the same language-bound scorer,
//! so pairs can run on the rayon pool without coordination. Output order
//! always matches input order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::core::config::BatchConfig;
use crate::core::errors::Result;
use crate::core::scoring::{SimilarityResult, SurfaceScorer};
use crate::io::records::{CodePair, Record};

/// Field written with `|SurfaceSim - ground truth|`
pub const ABS_DIFF_FIELD: &str = "abs_SurfaceSim_minus_score";

const SCORE_FIELDS: [&str; 3] = ["InverseEdit", "AST", "SurfaceSim"];

/// What happened to one input record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    /// Both snippets were scored
    Scored(SimilarityResult),
    /// The longer snippet exceeded `max_snippet_chars`; scores are null
    Oversized,
    /// The record had no usable code pair and passes through unchanged
    Skipped,
}

/// Input record augmented with its scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    /// Original fields plus score fields
    pub record: Record,
    /// Scoring outcome
    pub outcome: PairOutcome,
}

impl ScoredRecord {
    /// The scores, when the pair was scored
    pub fn result(&self) -> Option<&SimilarityResult> {
        match &self.outcome {
            PairOutcome::Scored(result) => Some(result),
            _ => None,
        }
    }
}

/// Counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Records seen
    pub total: usize,
    /// Records with scores
    pub scored: usize,
    /// Records passed through without a code pair
    pub skipped: usize,
    /// Records emitted with null scores because of the size bound
    pub oversized: usize,
}

impl BatchSummary {
    /// Tally outcomes
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        records.iter().fold(
            Self {
                total: records.len(),
                ..Self::default()
            },
            |mut summary, scored| {
                match scored.outcome {
                    PairOutcome::Scored(_) => summary.scored += 1,
                    PairOutcome::Oversized => summary.oversized += 1,
                    PairOutcome::Skipped => summary.skipped += 1,
                }
                summary
            },
        )
    }
}

/// Score every record for `language`.
///
/// The language is resolved before any record is touched, so an unsupported
/// tag fails the whole batch up front.
pub fn score_records(
    records: Vec<Record>,
    language: &str,
    config: &BatchConfig,
) -> Result<Vec<ScoredRecord>> {
    score_records_with_progress(records, language, config, &|| {})
}

/// [`score_records`] with a callback invoked once per finished record.
///
/// The callback may be called from several worker threads.
pub fn score_records_with_progress(
    records: Vec<Record>,
    language: &str,
    config: &BatchConfig,
    on_record: &(dyn Fn() + Sync),
) -> Result<Vec<ScoredRecord>> {
    let scorer = SurfaceScorer::for_language(language)?;
    info!(
        records = records.len(),
        language = scorer.language(),
        parallel = config.parallel,
        "batch scoring started"
    );

    let process = |(index, record): (usize, Record)| {
        let scored = score_record(&scorer, index, record, config);
        on_record();
        scored
    };

    let scored: Vec<ScoredRecord> = if config.parallel {
        run_parallel(records, process)
    } else {
        records.into_iter().enumerate().map(process).collect()
    };

    let summary = BatchSummary::from_records(&scored);
    info!(
        total = summary.total,
        scored = summary.scored,
        skipped = summary.skipped,
        oversized = summary.oversized,
        "batch scoring finished"
    );
    Ok(scored)
}

#[cfg(feature = "parallel")]
fn run_parallel<F>(records: Vec<Record>, process: F) -> Vec<ScoredRecord>
where
    F: Fn((usize, Record)) -> ScoredRecord + Sync + Send,
{
    use rayon::prelude::*;

    // indexed collect keeps input order
    records.into_par_iter().enumerate().map(process).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_parallel<F>(records: Vec<Record>, process: F) -> Vec<ScoredRecord>
where
    F: Fn((usize, Record)) -> ScoredRecord + Sync + Send,
{
    records.into_iter().enumerate().map(process).collect()
}

fn score_record(
    scorer: &SurfaceScorer,
    index: usize,
    mut record: Record,
    config: &BatchConfig,
) -> ScoredRecord {
    let Some(pair) = CodePair::from_record(&record, config) else {
        warn!(
            index,
            reference_field = %config.reference_field,
            candidate_field = %config.candidate_field,
            "record has no code pair, passing through"
        );
        return ScoredRecord {
            record,
            outcome: PairOutcome::Skipped,
        };
    };

    if let Some(limit) = config.max_snippet_chars {
        if pair.max_chars() > limit {
            warn!(index, id = ?pair.id, limit, "snippet exceeds size bound, emitting null scores");
            for field in SCORE_FIELDS {
                record.insert(field.to_string(), Value::Null);
            }
            return ScoredRecord {
                record,
                outcome: PairOutcome::Oversized,
            };
        }
    }

    let result = scorer.score(&pair.reference, &pair.candidate);
    record.insert("InverseEdit".to_string(), Value::from(result.inverse_edit));
    record.insert("AST".to_string(), Value::from(result.ast));
    record.insert("SurfaceSim".to_string(), Value::from(result.surface_sim));
    if config.emit_abs_diff {
        if let Some(truth) = pair.ground_truth {
            record.insert(
                ABS_DIFF_FIELD.to_string(),
                Value::from((result.surface_sim - truth).abs()),
            );
        }
    }

    ScoredRecord {
        record,
        outcome: PairOutcome::Scored(result),
    }
}
