//! # surface-sim: Surface Similarity Scoring for Code
//!
//! Measures how alike two code snippets *look*, independent of what they
//! do. Two complementary signals are combined:
//!
//! - **InverseEdit**: normalized Levenshtein similarity over a canonical
//!   token stream (comments, docstrings and layout removed)
//! - **AST**: Jaccard similarity of the sets of syntax node kinds
//! - **SurfaceSim**: the unweighted mean of the two
//!
//! Python-like and Java-like sources are supported. Scores are meant to be
//! set against a semantic ground truth to find pairs where form and meaning
//! disagree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            CLI (surfacesim) / batch / analysis              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core         │  Detectors      │  Language   │  I/O         │
//! │ • Scoring     │ • Edit distance │ • Python    │ • JSONL      │
//! │ • Normalize   │ • Structural    │ • Java      │ • Batch      │
//! │ • Config      │                 │ • Registry  │ • External   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use surface_sim::surface_similarity;
//!
//! let original = "def inc(x):\n    return x + 1\n";
//! let variant = "def inc(x):\n    # add one\n    return x + 1\n";
//!
//! let result = surface_similarity(original, variant, "python").unwrap();
//! assert_eq!(result.surface_sim, 1.0);
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Scoring core
pub mod core {
    //! Normalization pipeline, scoring, configuration and errors.

    pub mod config;
    pub mod errors;
    pub mod normalization;
    pub mod scoring;
}

// Similarity signals
pub mod detectors {
    //! The two similarity signals combined into SurfaceSim.

    pub mod edit_distance;
    pub mod structural;
}

// Language adapters
pub mod lang {
    //! Language-specific normalization and parsing.

    pub mod common;
    pub mod java;
    pub mod python;
    pub mod python_lexer;
    pub mod registry;
}

// Record I/O and batch scoring
pub mod io {
    //! JSONL records, batch scoring and the external scorer protocol.

    pub mod batch;
    pub mod external;
    pub mod records;
}

// Region analyses over scored datasets
pub mod analysis {
    //! Region classification, hit rates, MAE and threshold search.

    pub mod hit_rate;
    pub mod mae;
    pub mod regions;
    pub mod thresholds;
}

// Re-export primary types for convenience
pub use crate::core::config::SurfaceSimConfig;
pub use crate::core::errors::{Result, ResultExt, SurfaceSimError};
pub use crate::core::scoring::{surface_similarity, SimilarityResult, SurfaceScorer};
pub use crate::detectors::edit_distance::edit_distance_sim;
pub use crate::detectors::structural::ast_similarity;
pub use crate::lang::common::{LanguageAdapter, NormalizedForm};
pub use crate::lang::registry::adapter_for_language;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
