//! Language-tag keyed registry of adapters and tree-sitter grammars.
//!
//! Adapters and grammars are built once per process and shared read-only
//! between threads.

use once_cell::sync::Lazy;
use tree_sitter::Language;

use crate::core::errors::{Result, SurfaceSimError};
use crate::lang::common::LanguageAdapter;
use crate::lang::java::JavaAdapter;
use crate::lang::python::PythonAdapter;

/// Metadata describing one of the built-in language adapters.
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    /// Canonical key used in configs and on the command line.
    pub key: &'static str,
    /// Human-friendly display name.
    pub name: &'static str,
    /// Accepted aliases (lowercase).
    pub aliases: &'static [&'static str],
    /// Normalization strategy summary for documentation/UI.
    pub normalization: &'static str,
}

const REGISTERED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        key: "python",
        name: "Python",
        aliases: &["py", "python3"],
        normalization: "string-aware lexer, regex fallback",
    },
    LanguageInfo {
        key: "java",
        name: "Java",
        aliases: &[],
        normalization: "regex comment strip + re-tokenization",
    },
];

static PYTHON_ADAPTER: Lazy<PythonAdapter> = Lazy::new(PythonAdapter::new);
static JAVA_ADAPTER: Lazy<JavaAdapter> = Lazy::new(JavaAdapter::new);

static PYTHON_GRAMMAR: Lazy<Language> = Lazy::new(|| tree_sitter_python::LANGUAGE.into());
static JAVA_GRAMMAR: Lazy<Language> = Lazy::new(|| tree_sitter_java::LANGUAGE.into());

/// Return the languages that are compiled into this build.
pub fn registered_languages() -> &'static [LanguageInfo] {
    REGISTERED_LANGUAGES
}

/// Canonical keys of every registered language.
pub fn supported_keys() -> Vec<&'static str> {
    REGISTERED_LANGUAGES.iter().map(|info| info.key).collect()
}

/// Look up the shared adapter for a language tag.
///
/// Unknown tags are a configuration error; there is no default language.
pub fn adapter_for_language(language: &str) -> Result<&'static dyn LanguageAdapter> {
    match normalize_language_key(language) {
        Some("python") => Ok(&*PYTHON_ADAPTER),
        Some("java") => Ok(&*JAVA_ADAPTER),
        _ => Err(SurfaceSimError::unsupported_language(
            language,
            &supported_keys(),
        )),
    }
}

/// Get the tree-sitter grammar for a language tag
pub fn get_tree_sitter_language(language: &str) -> Result<Language> {
    match normalize_language_key(language) {
        Some("python") => Ok(PYTHON_GRAMMAR.clone()),
        Some("java") => Ok(JAVA_GRAMMAR.clone()),
        _ => Err(SurfaceSimError::unsupported_language(
            language,
            &supported_keys(),
        )),
    }
}

/// Whether a tag resolves to a registered language.
pub fn is_supported(language: &str) -> bool {
    normalize_language_key(language).is_some()
}

/// Normalizes a language identifier to its canonical key.
fn normalize_language_key(language: &str) -> Option<&'static str> {
    let lowered = language.trim().to_ascii_lowercase();
    REGISTERED_LANGUAGES
        .iter()
        .find(|info| info.key == lowered || info.aliases.iter().any(|alias| *alias == lowered))
        .map(|info| info.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_lookup_by_key_and_alias() {
        for tag in ["python", "py", "PYTHON", " python3 "] {
            let adapter = adapter_for_language(tag).unwrap();
            assert_eq!(adapter.key(), "python", "tag {tag:?}");
        }
        assert_eq!(adapter_for_language("Java").unwrap().key(), "java");
    }

    #[test]
    fn test_unknown_language_is_configuration_error() {
        let err = adapter_for_language("kotlin").err().unwrap();
        assert!(matches!(err, SurfaceSimError::UnsupportedLanguage { .. }));
        assert!(err.to_string().contains("kotlin"));
        assert!(err.to_string().contains("python, java"));
    }

    #[test]
    fn test_no_silent_default_for_empty_tag() {
        assert!(adapter_for_language("").is_err());
        assert!(!is_supported(""));
    }

    #[test]
    fn test_adapters_are_shared_instances() {
        let a = adapter_for_language("python").unwrap();
        let b = adapter_for_language("py").unwrap();
        assert!(std::ptr::eq(
            a as *const dyn LanguageAdapter as *const u8,
            b as *const dyn LanguageAdapter as *const u8
        ));
    }

    #[test]
    fn test_grammars_available() {
        for key in supported_keys() {
            assert!(get_tree_sitter_language(key).is_ok(), "grammar for {key}");
        }
        assert!(get_tree_sitter_language("cobol").is_err());
    }
}
