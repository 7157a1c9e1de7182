//! Configuration types for surface-sim runs.
//!
//! The scoring core itself takes no configuration beyond a language tag; the
//! sections here drive the batch adapter, the region analyses and the
//! external scorer. Loaded from YAML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ResultExt, SurfaceSimError};
use crate::lang::registry::{is_supported, supported_keys};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurfaceSimConfig {
    /// Default language tag for scoring
    #[serde(default = "default_language")]
    pub language: String,

    /// Batch scoring field mapping and execution settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Region boundaries for hit-rate analysis
    #[serde(default)]
    pub regions: RegionThresholds,

    /// Grid search over region boundaries
    #[serde(default)]
    pub threshold_search: ThresholdSearchConfig,

    /// Learned scorer run through the file protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_scorer: Option<ExternalScorerConfig>,
}

fn default_language() -> String {
    "python".to_string()
}

impl Default for SurfaceSimConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            batch: BatchConfig::default(),
            regions: RegionThresholds::default(),
            threshold_search: ThresholdSearchConfig::default(),
            external_scorer: None,
        }
    }
}

impl SurfaceSimConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if !is_supported(&self.language) {
            return Err(SurfaceSimError::unsupported_language(
                self.language.clone(),
                &supported_keys(),
            ));
        }
        self.batch.validate()?;
        self.regions.validate()?;
        self.threshold_search.validate()?;
        if let Some(external) = &self.external_scorer {
            external.validate()?;
        }
        Ok(())
    }
}

/// Field mapping and execution settings for batch scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Field holding the reference code
    pub reference_field: String,
    /// Field holding the candidate code
    pub candidate_field: String,
    /// Fields tried, in order, when `reference_field` is absent
    pub reference_fallbacks: Vec<String>,
    /// Fields tried, in order, when `candidate_field` is absent
    pub candidate_fallbacks: Vec<String>,
    /// Optional record identifier field
    pub id_field: String,
    /// Field holding the ground-truth semantic score
    pub ground_truth_field: String,
    /// Fields tried, in order, when `ground_truth_field` is absent
    pub ground_truth_fallbacks: Vec<String>,
    /// Score pairs on the rayon pool
    pub parallel: bool,
    /// Pairs whose longer snippet exceeds this many characters are not scored
    pub max_snippet_chars: Option<usize>,
    /// Add `abs_SurfaceSim_minus_score` when a ground truth is present
    pub emit_abs_diff: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            reference_field: "golden_code".to_string(),
            candidate_field: "generated_code".to_string(),
            reference_fallbacks: vec!["original_code".to_string()],
            candidate_fallbacks: vec!["variant_code".to_string()],
            id_field: "id".to_string(),
            ground_truth_field: "score".to_string(),
            ground_truth_fallbacks: vec!["df_score".to_string()],
            parallel: true,
            max_snippet_chars: None,
            emit_abs_diff: true,
        }
    }
}

impl BatchConfig {
    /// Validate field names and limits
    pub fn validate(&self) -> Result<()> {
        if self.reference_field.trim().is_empty() {
            return Err(SurfaceSimError::config_field(
                "reference field name must not be empty",
                "batch.reference_field",
            ));
        }
        if self.candidate_field.trim().is_empty() {
            return Err(SurfaceSimError::config_field(
                "candidate field name must not be empty",
                "batch.candidate_field",
            ));
        }
        if self.reference_field == self.candidate_field {
            return Err(SurfaceSimError::config_field(
                "reference and candidate fields must differ",
                "batch.candidate_field",
            ));
        }
        if self.max_snippet_chars == Some(0) {
            return Err(SurfaceSimError::config_field(
                "max_snippet_chars must be positive when set",
                "batch.max_snippet_chars",
            ));
        }
        Ok(())
    }
}

/// Four region boundaries on the (SurfaceSim, semantic score) plane
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionThresholds {
    /// SurfaceSim at or below which a pair counts as "different form"
    pub x_lo: f64,
    /// SurfaceSim at or above which a pair counts as "same form"
    pub x_hi: f64,
    /// Semantic score at or below which a pair counts as "different semantics"
    pub y_lo: f64,
    /// Semantic score at or above which a pair counts as "same semantics"
    pub y_hi: f64,
}

impl Default for RegionThresholds {
    fn default() -> Self {
        Self {
            x_lo: 0.65,
            x_hi: 0.90,
            y_lo: 0.10,
            y_hi: 0.90,
        }
    }
}

impl RegionThresholds {
    /// Thresholds must lie in [0, 1] with lo < hi on both axes
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("regions.x_lo", self.x_lo),
            ("regions.x_hi", self.x_hi),
            ("regions.y_lo", self.y_lo),
            ("regions.y_hi", self.y_hi),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SurfaceSimError::config_field(
                    format!("threshold {value} is outside [0, 1]"),
                    name,
                ));
            }
        }
        if self.x_lo >= self.x_hi {
            return Err(SurfaceSimError::config_field(
                "x_lo must be below x_hi",
                "regions.x_lo",
            ));
        }
        if self.y_lo >= self.y_hi {
            return Err(SurfaceSimError::config_field(
                "y_lo must be below y_hi",
                "regions.y_lo",
            ));
        }
        Ok(())
    }
}

/// Inclusive range of candidate values for one threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdRange {
    /// First grid value
    pub start: f64,
    /// Last grid value
    pub end: f64,
}

impl ThresholdRange {
    /// Construct a range
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Grid values `start, start + step, ..., end`, rounded to two decimals
    pub fn values(&self, step: f64) -> Vec<f64> {
        let count = ((self.end - self.start) / step).round() as usize;
        (0..=count)
            .map(|i| ((self.start + i as f64 * step) * 100.0).round() / 100.0)
            .collect()
    }
}

/// Grid search settings for region boundaries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdSearchConfig {
    /// Grid step
    pub step: f64,
    /// Candidates for `x_lo`
    pub x_lo: ThresholdRange,
    /// Candidates for `x_hi`
    pub x_hi: ThresholdRange,
    /// Candidates for `y_lo`
    pub y_lo: ThresholdRange,
    /// Candidates for `y_hi`
    pub y_hi: ThresholdRange,
    /// Minimum rows in the DFS corner
    pub min_dfs: usize,
    /// Minimum rows in the SFD corner
    pub min_sfd: usize,
    /// Minimum rows in the control region
    pub min_control: usize,
    /// Metric fields compared against the semantic score
    pub metrics: Vec<String>,
    /// Field holding the semantic score (y axis)
    pub semantic_field: String,
    /// Fields holding SurfaceSim (x axis), first present wins
    pub surface_fields: Vec<String>,
    /// Number of ranked candidates to report
    pub top_k: usize,
}

impl Default for ThresholdSearchConfig {
    fn default() -> Self {
        Self {
            step: 0.05,
            x_lo: ThresholdRange::new(0.10, 0.65),
            x_hi: ThresholdRange::new(0.40, 0.90),
            y_lo: ThresholdRange::new(0.10, 0.60),
            y_hi: ThresholdRange::new(0.40, 0.90),
            min_dfs: 50,
            min_sfd: 50,
            min_control: 150,
            metrics: ["codebleu", "codebertscore", "crystalbleu", "codescore"]
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            semantic_field: "score".to_string(),
            surface_fields: vec!["surfaceSim".to_string(), "SurfaceSim".to_string()],
            top_k: 5,
        }
    }
}

impl ThresholdSearchConfig {
    /// Validate the grid definition
    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err(SurfaceSimError::config_field(
                "step must be in (0, 1]",
                "threshold_search.step",
            ));
        }
        for (name, range) in [
            ("threshold_search.x_lo", self.x_lo),
            ("threshold_search.x_hi", self.x_hi),
            ("threshold_search.y_lo", self.y_lo),
            ("threshold_search.y_hi", self.y_hi),
        ] {
            if range.start > range.end || range.start < 0.0 || range.end > 1.0 {
                return Err(SurfaceSimError::config_field(
                    format!("range {}..{} is not an ordered subrange of [0, 1]", range.start, range.end),
                    name,
                ));
            }
        }
        if self.metrics.is_empty() {
            return Err(SurfaceSimError::config_field(
                "at least one metric field is required",
                "threshold_search.metrics",
            ));
        }
        if self.surface_fields.is_empty() {
            return Err(SurfaceSimError::config_field(
                "at least one SurfaceSim field is required",
                "threshold_search.surface_fields",
            ));
        }
        Ok(())
    }
}

/// Command-line learned scorer driven through request/response JSONL files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalScorerConfig {
    /// Executable to run
    pub program: String,
    /// Arguments placed before `--test_file` / `--out_file`
    #[serde(default)]
    pub args: Vec<String>,
    /// Wall-clock limit for one invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Response fields tried, in order, for the prediction value
    #[serde(default = "default_prediction_keys")]
    pub prediction_keys: Vec<String>,
    /// Field the prediction is written to in augmented records
    #[serde(default = "default_output_field")]
    pub output_field: String,
}

fn default_timeout_secs() -> u64 {
    1800
}

fn default_prediction_keys() -> Vec<String> {
    ["predict_score", "pred_score", "predicted_score", "prediction", "score"]
        .iter()
        .map(|k| (*k).to_string())
        .collect()
}

fn default_output_field() -> String {
    "codescore".to_string()
}

impl ExternalScorerConfig {
    /// Config for `program` with every other field defaulted
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            prediction_keys: default_prediction_keys(),
            output_field: default_output_field(),
        }
    }

    /// Validate program and keys
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(SurfaceSimError::config_field(
                "program must not be empty",
                "external_scorer.program",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(SurfaceSimError::config_field(
                "timeout must be positive",
                "external_scorer.timeout_secs",
            ));
        }
        if self.prediction_keys.is_empty() {
            return Err(SurfaceSimError::config_field(
                "at least one prediction key is required",
                "external_scorer.prediction_keys",
            ));
        }
        Ok(())
    }
}
