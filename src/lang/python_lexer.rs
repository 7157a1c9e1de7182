//! String-literal aware lexer for Python-like source.
//!
//! Produces the same token classes as the reference tokenizer (names, numbers,
//! strings, operators, comments, NL / NEWLINE) and rejects input that cannot
//! be tokenized: unterminated strings, unbalanced brackets at end of input,
//! dangling line continuations and inconsistent dedents.

use thiserror::Error;

/// Token classes emitted by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword
    Name,
    /// Numeric literal
    Number,
    /// String literal including prefix and quotes
    String,
    /// Operator or delimiter
    Op,
    /// `#` comment up to end of line
    Comment,
    /// Line break that does not end a logical line
    Nl,
    /// Line break ending a logical line
    Newline,
    /// Character with no token class of its own
    ErrorToken,
}

/// A lexed token borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token class
    pub kind: TokenKind,
    /// Exact source slice
    pub text: &'a str,
    /// 1-based line where the token starts
    pub line: usize,
}

/// Tokenization failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct LexError {
    /// Description of the failure
    pub message: &'static str,
    /// 1-based line the failure refers to
    pub line: usize,
}

pub(crate) const OPERATORS_3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
pub(crate) const OPERATORS_2: &[&str] = &[
    "->", ":=", "**", "//", "<<", ">>", "<=", ">=", "==", "!=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];
const OPERATORS_1: &str = "+-*/%@&|^~<>()[]{},:;.=";
const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];
const TAB_SIZE: usize = 8;

/// Tokenize Python-like source text.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    paren_depth: usize,
    indents: Vec<usize>,
    at_line_start: bool,
    continuation: bool,
    line_has_tokens: bool,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            paren_depth: 0,
            indents: vec![0],
            at_line_start: true,
            continuation: false,
            line_has_tokens: false,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, LexError> {
        while self.pos < self.bytes.len() {
            if self.at_line_start {
                self.at_line_start = false;
                if self.paren_depth == 0 && !self.continuation {
                    self.handle_indentation()?;
                } else {
                    self.skip_horizontal_ws();
                }
                self.continuation = false;
                continue;
            }

            let c = self.bytes[self.pos];
            match c {
                b' ' | b'\t' | b'\x0c' => self.pos += 1,
                b'\n' => self.newline(1),
                b'\r' => {
                    let width = if self.peek(1) == Some(b'\n') { 2 } else { 1 };
                    self.newline(width);
                }
                b'#' => self.comment(),
                b'\\' => self.backslash()?,
                b'"' | b'\'' => self.string(self.pos, self.pos)?,
                b'0'..=b'9' => self.number(),
                b'.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                _ => {
                    let ch = self.current_char();
                    if ch == '_' || ch.is_alphabetic() {
                        self.name_or_prefixed_string()?;
                    } else if !self.operator() {
                        self.push(TokenKind::ErrorToken, self.pos, self.pos + ch.len_utf8());
                        self.pos += ch.len_utf8();
                    }
                }
            }
        }

        if self.continuation || self.paren_depth > 0 {
            return Err(LexError {
                message: "EOF in multi-line statement",
                line: self.line,
            });
        }
        if self.line_has_tokens {
            self.tokens.push(Token {
                kind: TokenKind::Newline,
                text: "",
                line: self.line,
            });
        }
        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn current_char(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        if !matches!(kind, TokenKind::Comment | TokenKind::Nl | TokenKind::Newline) {
            self.line_has_tokens = true;
        }
        self.tokens.push(Token {
            kind,
            text: &self.src[start..end],
            line: self.line,
        });
    }

    fn skip_horizontal_ws(&mut self) {
        while matches!(self.peek(0), Some(b' ' | b'\t' | b'\x0c')) {
            self.pos += 1;
        }
    }

    /// Measure leading whitespace of a logical line and update the indent stack.
    fn handle_indentation(&mut self) -> Result<(), LexError> {
        let mut column = 0usize;
        while let Some(b) = self.peek(0) {
            match b {
                b' ' => column += 1,
                b'\t' => column = (column / TAB_SIZE + 1) * TAB_SIZE,
                b'\x0c' => column = 0,
                _ => break,
            }
            self.pos += 1;
        }

        // Blank and comment-only lines do not take part in indentation
        match self.peek(0) {
            None | Some(b'\n' | b'\r' | b'#') => return Ok(()),
            _ => {}
        }

        let top = *self.indents.last().unwrap_or(&0);
        if column > top {
            self.indents.push(column);
        } else if column < top {
            while self.indents.last().is_some_and(|&level| column < level) {
                self.indents.pop();
            }
            if self.indents.last() != Some(&column) {
                return Err(LexError {
                    message: "unindent does not match any outer indentation level",
                    line: self.line,
                });
            }
        }
        Ok(())
    }

    fn newline(&mut self, width: usize) {
        let kind = if self.paren_depth == 0 && self.line_has_tokens {
            TokenKind::Newline
        } else {
            TokenKind::Nl
        };
        self.tokens.push(Token {
            kind,
            text: &self.src[self.pos..self.pos + width],
            line: self.line,
        });
        if kind == TokenKind::Newline {
            self.line_has_tokens = false;
        }
        self.pos += width;
        self.line += 1;
        self.at_line_start = true;
    }

    fn comment(&mut self) {
        let start = self.pos;
        while !matches!(self.peek(0), None | Some(b'\n' | b'\r')) {
            self.pos += 1;
        }
        self.push(TokenKind::Comment, start, self.pos);
    }

    fn backslash(&mut self) -> Result<(), LexError> {
        match (self.peek(1), self.peek(2)) {
            (Some(b'\n'), _) => self.pos += 2,
            (Some(b'\r'), Some(b'\n')) => self.pos += 3,
            (Some(b'\r'), _) => self.pos += 2,
            (None, _) => {
                return Err(LexError {
                    message: "unexpected EOF after line continuation",
                    line: self.line,
                })
            }
            _ => {
                self.push(TokenKind::ErrorToken, self.pos, self.pos + 1);
                self.pos += 1;
                return Ok(());
            }
        }
        self.line += 1;
        self.continuation = true;
        self.at_line_start = true;
        Ok(())
    }

    fn name_or_prefixed_string(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        while let Some(ch) = self.src[self.pos..].chars().next() {
            if ch == '_' || ch.is_alphanumeric() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }

        let word = &self.src[start..self.pos];
        let is_prefix = word.len() <= 2
            && STRING_PREFIXES
                .iter()
                .any(|prefix| prefix.eq_ignore_ascii_case(word));
        if is_prefix && matches!(self.peek(0), Some(b'"' | b'\'')) {
            return self.string(start, self.pos);
        }

        self.push(TokenKind::Name, start, self.pos);
        Ok(())
    }

    /// Lex a string whose prefix starts at `start` and whose quote is at `quote_pos`.
    fn string(&mut self, start: usize, quote_pos: usize) -> Result<(), LexError> {
        let quote = self.bytes[quote_pos];
        let start_line = self.line;
        let triple = self.bytes.get(quote_pos + 1) == Some(&quote)
            && self.bytes.get(quote_pos + 2) == Some(&quote);
        let mut i = quote_pos + if triple { 3 } else { 1 };
        let mut lines_consumed = 0;

        loop {
            let Some(&b) = self.bytes.get(i) else {
                return Err(LexError {
                    message: if triple {
                        "EOF in multi-line string"
                    } else {
                        "unterminated string literal"
                    },
                    line: start_line,
                });
            };

            match b {
                b'\\' => {
                    // An escaped quote never terminates, even in raw strings
                    if self.bytes.get(i + 1) == Some(&b'\n') {
                        lines_consumed += 1;
                    }
                    i += 2;
                }
                b'\n' if !triple => {
                    return Err(LexError {
                        message: "unterminated string literal",
                        line: start_line,
                    });
                }
                b'\n' => {
                    lines_consumed += 1;
                    i += 1;
                }
                _ if b == quote => {
                    if !triple {
                        i += 1;
                        break;
                    }
                    if self.bytes.get(i + 1) == Some(&quote)
                        && self.bytes.get(i + 2) == Some(&quote)
                    {
                        i += 3;
                        break;
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }

        let end = i.min(self.bytes.len());
        self.push(TokenKind::String, start, end);
        self.pos = end;
        self.line += lines_consumed;
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        let is_digit_or_sep = |b: u8| b.is_ascii_digit() || b == b'_';

        let radix_prefix = self.peek(0) == Some(b'0')
            && matches!(self.peek(1), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B'));
        if radix_prefix {
            self.pos += 2;
            while self
                .peek(0)
                .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
            {
                self.pos += 1;
            }
            self.push(TokenKind::Number, start, self.pos);
            return;
        }

        while self.peek(0).is_some_and(is_digit_or_sep) {
            self.pos += 1;
        }
        if self.peek(0) == Some(b'.') {
            self.pos += 1;
            while self.peek(0).is_some_and(is_digit_or_sep) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let signed = matches!(self.peek(1), Some(b'+' | b'-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += digit_at;
                while self.peek(0).is_some_and(is_digit_or_sep) {
                    self.pos += 1;
                }
            }
        }
        if matches!(self.peek(0), Some(b'j' | b'J')) {
            self.pos += 1;
        }
        self.push(TokenKind::Number, start, self.pos);
    }

    fn operator(&mut self) -> bool {
        let rest = &self.src[self.pos..];
        let matched = OPERATORS_3
            .iter()
            .chain(OPERATORS_2.iter())
            .find(|op| rest.starts_with(**op))
            .map(|op| op.len())
            .or_else(|| {
                rest.chars()
                    .next()
                    .filter(|ch| OPERATORS_1.contains(*ch))
                    .map(char::len_utf8)
            });

        let Some(len) = matched else {
            return false;
        };

        match self.bytes[self.pos] {
            b'(' | b'[' | b'{' if len == 1 => self.paren_depth += 1,
            b')' | b']' | b'}' if len == 1 => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
            }
            _ => {}
        }
        self.push(TokenKind::Op, self.pos, self.pos + len);
        self.pos += len;
        true
    }
}
