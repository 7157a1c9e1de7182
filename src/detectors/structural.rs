//! Structural similarity: Jaccard overlap of syntax node-kind sets.

use tracing::debug;

use crate::core::errors::Result;
use crate::lang::common::{LanguageAdapter, NodeKindSet};
use crate::lang::registry::adapter_for_language;

/// `|a ∩ b| / |a ∪ b|`, with an empty union scoring 0.0.
pub fn jaccard(a: &NodeKindSet, b: &NodeKindSet) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Structural similarity under a resolved adapter.
///
/// A syntax error in either snippet scores 0.0; no partial trees are compared.
pub fn ast_similarity_with(adapter: &dyn LanguageAdapter, src: &str, tgt: &str) -> f64 {
    let kinds = adapter
        .parse_node_kinds(src)
        .and_then(|src_kinds| adapter.parse_node_kinds(tgt).map(|tgt_kinds| (src_kinds, tgt_kinds)));

    match kinds {
        Ok((src_kinds, tgt_kinds)) => jaccard(&src_kinds, &tgt_kinds),
        Err(failure) => {
            debug!(
                language = adapter.key(),
                line = failure.line,
                column = failure.column,
                "structural similarity short-circuited on parse failure"
            );
            0.0
        }
    }
}

/// Structural similarity of two snippets for a language tag.
pub fn ast_similarity(src: &str, tgt: &str, language: &str) -> Result<f64> {
    let adapter = adapter_for_language(language)?;
    Ok(ast_similarity_with(adapter, src, tgt))
}
