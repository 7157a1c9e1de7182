//! Normalized Levenshtein similarity over normalized code.
//!
//! `1 - distance / max(len_a, len_b)` where lengths and edits are counted in
//! characters of the normalized forms. Two empty forms are identical by
//! vacuity and score 1.0.

use crate::core::errors::Result;
use crate::lang::common::{LanguageAdapter, NormalizedForm};
use crate::lang::registry::adapter_for_language;

/// Similarity in [0, 1] between two already-normalized forms.
pub fn normalized_similarity(a: &NormalizedForm, b: &NormalizedForm) -> f64 {
    let max_len = a.char_len().max(b.char_len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = edit_distance::edit_distance(a.text(), b.text());
    1.0 - (distance as f64 / max_len as f64)
}

/// Edit-distance similarity of two snippets under a resolved adapter.
pub fn edit_distance_sim_with(adapter: &dyn LanguageAdapter, src: &str, tgt: &str) -> f64 {
    let normalized_src = adapter.normalize(src);
    let normalized_tgt = adapter.normalize(tgt);
    normalized_similarity(&normalized_src, &normalized_tgt)
}

/// Edit-distance similarity of two snippets for a language tag.
///
/// Fails only when the tag is not a registered language.
pub fn edit_distance_sim(src: &str, tgt: &str, language: &str) -> Result<f64> {
    let adapter = adapter_for_language(language)?;
    Ok(edit_distance_sim_with(adapter, src, tgt))
}
