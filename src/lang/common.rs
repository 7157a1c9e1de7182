//! Common normalization and parsing abstractions shared by the language adapters.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser};

/// Marker emitted between lines in a normalized token stream.
pub const NEWLINE_MARKER: &str = "\n";

/// Set of distinct node-kind labels found in a syntax tree.
///
/// Ordered so that debugging output and serialized forms are stable.
pub type NodeKindSet = BTreeSet<&'static str>;

static HORIZONTAL_WS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+").expect("static regex must compile"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("static regex must compile"));

/// Canonical, comment-free rendering of a code snippet.
///
/// Lines hold tokens in source order. Empty lines never survive construction,
/// so consecutive blank lines in the input collapse into one separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedForm {
    lines: Vec<Vec<String>>,
    text: String,
    strategy: &'static str,
}

impl NormalizedForm {
    /// The normalized form of empty input.
    pub fn empty(strategy: &'static str) -> Self {
        Self {
            lines: Vec::new(),
            text: String::new(),
            strategy,
        }
    }

    /// Build a line-oriented form. Tokens are joined by single spaces and
    /// lines by a single newline; empty lines are dropped.
    pub fn from_lines<I, L, T>(lines: I, strategy: &'static str) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let lines: Vec<Vec<String>> = lines
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .map(|token| canonical_token(token.as_ref()))
                    .filter(|token| !token.trim().is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|line| !line.is_empty())
            .collect();

        let text = lines
            .iter()
            .map(|line| line.join(" "))
            .collect::<Vec<_>>()
            .join(NEWLINE_MARKER);

        Self {
            lines,
            text,
            strategy,
        }
    }

    /// Build a single-line form from a flat token sequence.
    pub fn from_tokens<I, T>(tokens: I, strategy: &'static str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::from_lines(std::iter::once(tokens), strategy)
    }

    /// Rendered text fed to the edit-distance metric.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Token stream with [`NEWLINE_MARKER`] between lines.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().enumerate().flat_map(|(idx, line)| {
            let marker: Option<&str> = (idx > 0).then_some(NEWLINE_MARKER);
            marker.into_iter().chain(line.iter().map(String::as_str))
        })
    }

    /// Number of non-empty lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length in Unicode scalar values, the unit the edit distance works in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether nothing survived normalization.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Name of the pipeline tier that produced this form.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }
}

/// Collapse whitespace inside a single token (string literals may carry runs).
fn canonical_token(token: &str) -> String {
    let collapsed = HORIZONTAL_WS.replace_all(token, " ");
    BLANK_RUNS.replace_all(&collapsed, "\n").into_owned()
}

/// Raised by a fallible normalization tier; never escapes the pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{strategy} failed at line {line}: {message}")]
pub struct NormalizationFailure {
    /// Tier that gave up
    pub strategy: &'static str,
    /// What went wrong
    pub message: String,
    /// 1-based line where the problem was detected
    pub line: usize,
}

/// A snippet did not parse cleanly under the declared grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{language} syntax error near line {line}, column {column}")]
pub struct ParseFailure {
    /// Language key of the grammar used
    pub language: &'static str,
    /// 1-based line of the first error node
    pub line: usize,
    /// 1-based column of the first error node
    pub column: usize,
}

impl ParseFailure {
    fn at(language: &'static str, node: Option<Node<'_>>) -> Self {
        let (line, column) = node
            .map(|n| {
                let p = n.start_position();
                (p.row + 1, p.column + 1)
            })
            .unwrap_or((1, 1));
        Self {
            language,
            line,
            column,
        }
    }
}

/// Capability interface every language variant implements.
///
/// Implementations are stateless and shared process-wide, hence `Send + Sync`.
pub trait LanguageAdapter: Send + Sync {
    /// Canonical language key (`python`, `java`).
    fn key(&self) -> &'static str;

    /// Human-friendly display name.
    fn name(&self) -> &'static str;

    /// Comment-free, whitespace-canonical rendering. Never fails.
    fn normalize(&self, source: &str) -> NormalizedForm;

    /// Distinct syntax node kinds, or the location of the first syntax error.
    fn parse_node_kinds(&self, source: &str) -> Result<NodeKindSet, ParseFailure>;
}

/// Parse `source` with a tree-sitter grammar and collect named node kinds.
///
/// Comment nodes are skipped so that comment edits never move the structural
/// score. Any ERROR or MISSING node anywhere in the tree is a parse failure,
/// and so is any node whose kind is in `rejected_kinds` (constructs the
/// grammar tolerates but the language version does not).
pub fn collect_node_kinds(
    language: &Language,
    language_key: &'static str,
    comment_kinds: &[&str],
    rejected_kinds: &[&str],
    source: &str,
) -> Result<NodeKindSet, ParseFailure> {
    let mut parser = Parser::new();
    if parser.set_language(language).is_err() {
        return Err(ParseFailure::at(language_key, None));
    }

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseFailure::at(language_key, None))?;
    let root = tree.root_node();

    if root.has_error() {
        return Err(ParseFailure::at(language_key, first_error(root)));
    }

    let mut kinds = NodeKindSet::new();
    let mut cursor = root.walk();

    // Iterative pre-order walk to avoid recursion depth limits on deep trees
    'walk: loop {
        let node = cursor.node();
        if rejected_kinds.contains(&node.kind()) {
            return Err(ParseFailure::at(language_key, Some(node)));
        }
        if node.is_named() && !comment_kinds.contains(&node.kind()) {
            kinds.insert(node.kind());
        }

        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    Ok(kinds)
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}
