//! Ordered, multi-tier normalization pipeline.
//!
//! Each language registers zero or more fallible tiers followed by one
//! infallible fallback. Tiers are tried in order; the first success wins and
//! a failure moves on to the next tier. The fallback guarantees that
//! normalization as a whole never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::lang::common::{NormalizationFailure, NormalizedForm};

/// Word / number / single punctuation units, the regex-level token grammar.
pub static WORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_]\w*|\d+|\S").expect("static regex must compile"));

/// A normalization tier that may reject its input.
pub trait NormalizationStrategy: Send + Sync {
    /// Name recorded on the produced [`NormalizedForm`].
    fn name(&self) -> &'static str;

    /// Normalize `source`, or explain why this tier cannot.
    fn normalize(&self, source: &str) -> Result<NormalizedForm, NormalizationFailure>;
}

/// The last tier of a pipeline; must accept any input.
pub trait FallbackStrategy: Send + Sync {
    /// Name recorded on the produced [`NormalizedForm`].
    fn name(&self) -> &'static str;

    /// Best-effort normalization.
    fn normalize(&self, source: &str) -> NormalizedForm;
}

/// Tiers tried in sequence, ending in an infallible fallback.
pub struct NormalizationPipeline {
    language: &'static str,
    tiers: Vec<Box<dyn NormalizationStrategy>>,
    fallback: Box<dyn FallbackStrategy>,
}

impl NormalizationPipeline {
    /// Pipeline consisting of just the fallback tier.
    pub fn new(language: &'static str, fallback: impl FallbackStrategy + 'static) -> Self {
        Self {
            language,
            tiers: Vec::new(),
            fallback: Box::new(fallback),
        }
    }

    /// Append a fallible tier; tiers run in insertion order before the fallback.
    #[must_use]
    pub fn with_tier(mut self, tier: impl NormalizationStrategy + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// Tier names in the order they are attempted.
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers
            .iter()
            .map(|tier| tier.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Run the pipeline. Empty input yields an empty form.
    pub fn run(&self, source: &str) -> NormalizedForm {
        if source.is_empty() {
            let first = self
                .tiers
                .first()
                .map_or_else(|| self.fallback.name(), |tier| tier.name());
            return NormalizedForm::empty(first);
        }

        for tier in &self.tiers {
            match tier.normalize(source) {
                Ok(form) => return form,
                Err(failure) => {
                    debug!(
                        language = self.language,
                        tier = tier.name(),
                        line = failure.line,
                        "normalization tier rejected input: {}",
                        failure.message
                    );
                }
            }
        }

        self.fallback.normalize(source)
    }

    /// Run only the fallback tier (exposed so it can be exercised directly).
    pub fn run_fallback(&self, source: &str) -> NormalizedForm {
        if source.is_empty() {
            return NormalizedForm::empty(self.fallback.name());
        }
        self.fallback.normalize(source)
    }
}

impl std::fmt::Debug for NormalizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizationPipeline")
            .field("language", &self.language)
            .field("tiers", &self.tier_names())
            .finish()
    }
}

/// Split text into the units matched by `token`, one vector per line.
pub fn regex_tokenize_lines<'t>(text: &'t str, token: &Regex) -> Vec<Vec<&'t str>> {
    text.lines()
        .map(|line| token.find_iter(line).map(|m| m.as_str()).collect())
        .collect()
}
