//! CLI Argument Structures
//!
//! Command and argument definitions for the surfacesim binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use surface_sim::VERSION;

/// Surface similarity scoring for code pairs
#[derive(Parser)]
#[command(name = "surfacesim")]
#[command(version = VERSION)]
#[command(about = "📐 surfacesim - lexical and structural similarity of code pairs")]
#[command(long_about = "
Score how alike two code snippets look, independent of what they compute.
SurfaceSim is the mean of a normalized edit-distance similarity and a
Jaccard similarity over syntax node kinds.

Common Usage:

  # Score two files
  surfacesim score --reference a.py --candidate b.py

  # Score a JSONL dataset of golden_code / generated_code pairs
  surfacesim batch --input pairs.jsonl --output scored.jsonl --language java

  # Search region thresholds over a scored dataset
  surfacesim thresholds --input scored.jsonl

  # Show supported languages
  surfacesim list-languages
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score one pair of files
    Score(ScoreArgs),

    /// Score every pair in a JSONL file
    Batch(BatchArgs),

    /// Grid-search region thresholds over a scored JSONL file
    Thresholds(ThresholdsArgs),

    /// Count mutations in SFD and optimizations in DFS
    #[command(name = "hit-rate")]
    HitRate(HitRateArgs),

    /// Mean absolute error between ground truth and predictions
    Mae(MaeArgs),

    /// Run the configured external learned scorer over a JSONL file
    External(ExternalArgs),

    /// List supported languages
    #[command(name = "list-languages")]
    ListLanguages,

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Output format for single-shot results
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Machine-readable JSON on stdout
    Json,
    /// Colored table
    Pretty,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// File holding the reference snippet
    #[arg(short, long)]
    pub reference: PathBuf,

    /// File holding the candidate snippet
    #[arg(short = 'n', long)]
    pub candidate: PathBuf,

    /// Language tag (python, py, python3, java)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Input JSONL file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output JSONL file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Language tag
    #[arg(short, long)]
    pub language: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Score pairs on a single thread
    #[arg(long)]
    pub no_parallel: bool,

    /// Skip pairs whose longer snippet exceeds this many characters
    #[arg(long)]
    pub max_snippet_chars: Option<usize>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ThresholdsArgs {
    /// Scored JSONL file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Grid step
    #[arg(long)]
    pub step: Option<f64>,

    /// Minimum DFS rows
    #[arg(long)]
    pub min_dfs: Option<usize>,

    /// Minimum SFD rows
    #[arg(long)]
    pub min_sfd: Option<usize>,

    /// Minimum Control rows
    #[arg(long)]
    pub min_control: Option<usize>,

    /// Number of candidates to show
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct HitRateArgs {
    /// Scored JSONL file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SurfaceSim at or below which form differs
    #[arg(long)]
    pub x_lo: Option<f64>,

    /// SurfaceSim at or above which form matches
    #[arg(long)]
    pub x_hi: Option<f64>,

    /// Semantic score at or below which semantics differ
    #[arg(long)]
    pub y_lo: Option<f64>,

    /// Semantic score at or above which semantics match
    #[arg(long)]
    pub y_hi: Option<f64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct MaeArgs {
    /// JSONL file with ground truth and predictions
    #[arg(short, long)]
    pub input: PathBuf,

    /// Ground-truth field
    #[arg(long, default_value = "score")]
    pub truth_field: String,

    /// Prediction field; repeat to try several in order
    #[arg(short, long = "prediction-key")]
    pub prediction_keys: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExternalArgs {
    /// Input JSONL file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output JSONL file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Configuration file with an external_scorer section
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scorer program, overriding the configuration
    #[arg(long)]
    pub program: Option<String>,

    /// Timeout in seconds, overriding the configuration
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".surfacesim.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,

    /// Show detailed configuration breakdown
    #[arg(long)]
    pub detailed: bool,
}
