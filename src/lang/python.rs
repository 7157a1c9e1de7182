//! Python language adapter.
//!
//! Normalization is a two-tier pipeline: the string-aware lexer first, then a
//! regex tier for input the lexer rejects (partial or syntactically broken
//! code). Structure comes from the tree-sitter Python grammar.

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    collect_node_kinds, LanguageAdapter, NodeKindSet, NormalizationFailure, NormalizedForm,
    ParseFailure,
};
use super::python_lexer::{tokenize, Token, TokenKind, OPERATORS_2, OPERATORS_3};
use super::registry::get_tree_sitter_language;
use crate::core::normalization::{
    regex_tokenize_lines, FallbackStrategy, NormalizationPipeline, NormalizationStrategy,
};

#[cfg(test)]
#[path = "python_tests.rs"]
mod tests;

const LANGUAGE_KEY: &str = "python";
const COMMENT_KINDS: &[&str] = &["comment"];
/// Python 2 statements the grammar still accepts; syntax errors in Python 3.
const PY2_ONLY_KINDS: &[&str] = &["print_statement", "exec_statement"];

/// Triple-quoted blocks, matched lazily across lines.
static TRIPLE_STR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)""".*?"""|'''.*?'''"#).expect("static regex must compile")
});
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[^\n]*").expect("static regex must compile"));
/// Word/number/punctuation units, keeping the lexer's multi-character
/// operators whole (longest first, the regex is leftmost-first).
static FALLBACK_TOKEN: Lazy<Regex> = Lazy::new(|| {
    let operators = OPERATORS_3
        .iter()
        .chain(OPERATORS_2)
        .map(|op| regex::escape(op))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"[A-Za-z_]\w*|\d+|{operators}|\S")).expect("static regex must compile")
});

/// Python-specific normalization and parsing
#[derive(Debug)]
pub struct PythonAdapter {
    pipeline: NormalizationPipeline,
}

impl PythonAdapter {
    /// Create a new Python adapter
    pub fn new() -> Self {
        Self {
            pipeline: NormalizationPipeline::new(LANGUAGE_KEY, RegexFallback)
                .with_tier(LexicalNormalizer),
        }
    }

    /// The normalization pipeline, tiers in attempt order.
    pub fn pipeline(&self) -> &NormalizationPipeline {
        &self.pipeline
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for PythonAdapter {
    fn key(&self) -> &'static str {
        LANGUAGE_KEY
    }

    fn name(&self) -> &'static str {
        "Python"
    }

    fn normalize(&self, source: &str) -> NormalizedForm {
        self.pipeline.run(source)
    }

    fn parse_node_kinds(&self, source: &str) -> Result<NodeKindSet, ParseFailure> {
        let language = get_tree_sitter_language(LANGUAGE_KEY).map_err(|_| ParseFailure {
            language: LANGUAGE_KEY,
            line: 1,
            column: 1,
        })?;
        collect_node_kinds(&language, LANGUAGE_KEY, COMMENT_KINDS, PY2_ONLY_KINDS, source)
    }
}

/// Lexer-driven tier: drops comments, indentation and standalone string
/// statements (docstrings), keeps every other token and each line break.
pub struct LexicalNormalizer;

impl LexicalNormalizer {
    /// Tier name as reported on [`NormalizedForm::strategy`].
    pub const NAME: &'static str = "python-lexer";
}

impl NormalizationStrategy for LexicalNormalizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn normalize(&self, source: &str) -> Result<NormalizedForm, NormalizationFailure> {
        let tokens = tokenize(source).map_err(|err| NormalizationFailure {
            strategy: Self::NAME,
            message: err.message.to_string(),
            line: err.line,
        })?;

        let mut lines: Vec<Vec<&str>> = Vec::new();
        for logical in logical_lines(&tokens) {
            if logical.is_docstring() {
                continue;
            }
            lines.extend(logical.physical);
        }

        Ok(NormalizedForm::from_lines(lines, Self::NAME))
    }
}

/// Tokens of one logical line, split at physical (NL) breaks.
struct LogicalLine<'a> {
    physical: Vec<Vec<&'a str>>,
    only_strings: bool,
    has_tokens: bool,
}

impl<'a> LogicalLine<'a> {
    fn new() -> Self {
        Self {
            physical: vec![Vec::new()],
            only_strings: true,
            has_tokens: false,
        }
    }

    /// A statement made of nothing but string literals has no effect.
    fn is_docstring(&self) -> bool {
        self.has_tokens && self.only_strings
    }

    fn push(&mut self, token: &Token<'a>) {
        self.has_tokens = true;
        self.only_strings &= token.kind == TokenKind::String;
        if let Some(current) = self.physical.last_mut() {
            current.push(token.text);
        }
    }

    fn break_physical(&mut self) {
        self.physical.push(Vec::new());
    }
}

fn logical_lines<'a>(tokens: &[Token<'a>]) -> Vec<LogicalLine<'a>> {
    let mut out = Vec::new();
    let mut current = LogicalLine::new();

    for token in tokens {
        match token.kind {
            TokenKind::Comment => {}
            TokenKind::Nl => current.break_physical(),
            TokenKind::Newline => {
                out.push(std::mem::replace(&mut current, LogicalLine::new()));
            }
            _ => current.push(token),
        }
    }
    if current.has_tokens {
        out.push(current);
    }
    out
}

/// Regex tier for input the lexer rejects.
///
/// Removes triple-quoted blocks and `#` comments textually, then splits each
/// line into word/number/operator/punctuation units, with the same
/// multi-character operators the lexer recognizes. It cannot tell a `#` inside a
/// string literal from a real comment, and removes every triple-quoted block
/// whether or not it is a docstring.
pub struct RegexFallback;

impl RegexFallback {
    /// Tier name as reported on [`NormalizedForm::strategy`].
    pub const NAME: &'static str = "python-regex";
}

impl FallbackStrategy for RegexFallback {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn normalize(&self, source: &str) -> NormalizedForm {
        let without_blocks = TRIPLE_STR.replace_all(source, "");
        let without_comments = LINE_COMMENT.replace_all(&without_blocks, "");
        NormalizedForm::from_lines(
            regex_tokenize_lines(&without_comments, &FALLBACK_TOKEN),
            Self::NAME,
        )
    }
}
