//! The SurfaceSim aggregator.
//!
//! SurfaceSim is the unweighted arithmetic mean of the edit-distance and
//! structural similarities. The equal weighting is fixed and intentionally
//! not configurable.

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::detectors::edit_distance::edit_distance_sim_with;
use crate::detectors::structural::ast_similarity_with;
use crate::lang::common::LanguageAdapter;
use crate::lang::registry::adapter_for_language;

/// Scores for one (reference, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Normalized edit-distance similarity
    #[serde(rename = "InverseEdit")]
    pub inverse_edit: f64,
    /// Jaccard similarity of node-kind sets
    #[serde(rename = "AST")]
    pub ast: f64,
    /// Mean of the two
    #[serde(rename = "SurfaceSim")]
    pub surface_sim: f64,
}

impl SimilarityResult {
    /// Combine the two sub-scores.
    pub fn from_components(inverse_edit: f64, ast: f64) -> Self {
        Self {
            inverse_edit,
            ast,
            surface_sim: (inverse_edit + ast) / 2.0,
        }
    }
}

/// A language-bound scorer. Cheap to copy and safe to share across threads.
#[derive(Clone, Copy)]
pub struct SurfaceScorer {
    adapter: &'static dyn LanguageAdapter,
}

impl SurfaceScorer {
    /// Resolve the adapter for `language` once, up front.
    pub fn for_language(language: &str) -> Result<Self> {
        Ok(Self {
            adapter: adapter_for_language(language)?,
        })
    }

    /// Canonical key of the bound language.
    pub fn language(&self) -> &'static str {
        self.adapter.key()
    }

    /// Score one pair.
    pub fn score(&self, src: &str, tgt: &str) -> SimilarityResult {
        let inverse_edit = edit_distance_sim_with(self.adapter, src, tgt);
        let ast = ast_similarity_with(self.adapter, src, tgt);
        SimilarityResult::from_components(inverse_edit, ast)
    }
}

impl std::fmt::Debug for SurfaceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceScorer")
            .field("language", &self.adapter.key())
            .finish()
    }
}

/// Score a pair of snippets written in `language`.
///
/// The only error is an unsupported language tag.
pub fn surface_similarity(src: &str, tgt: &str, language: &str) -> Result<SimilarityResult> {
    Ok(SurfaceScorer::for_language(language)?.score(src, tgt))
}
