//! Diagnostics for plan syntax checking
//!
//! A [`Diagnostic`] describes one syntax failure in a model-emitted plan.
//! It is the unit of feedback in the closed-loop retry protocol: the session
//! controller embeds rendered diagnostics verbatim in the follow-up prompt,
//! so each one must say *what* was wrong and *where*, not just that parsing
//! failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic codes for categorizing syntax issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// `{` without a matching `}`, or a stray `}`
    UnbalancedBlock,
    /// A `'` string literal left open
    UnclosedString,
    /// Any other malformed construct reported by the parser
    SyntaxError,
}

/// Source location span (line/column, 1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: u32,
    pub col: u32,
}

impl SourceSpan {
    /// Create a span from a byte offset into the source text.
    pub fn from_byte_offset(source: &str, offset: usize) -> Self {
        let (line, col) = byte_to_line_col(source, offset);
        Self { line, col }
    }
}

/// Convert byte offset to line and column
fn byte_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// One structured syntax failure, suitable for direct prompt inclusion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Byte offset into the plan source.
    pub offset: usize,
    pub span: SourceSpan,
    /// The offending fragment, truncated.
    pub snippet: String,
}

impl Diagnostic {
    pub fn error(
        source: &str,
        code: DiagnosticCode,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            offset,
            span: SourceSpan::from_byte_offset(source, offset),
            snippet: snippet_at(source, offset),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error at position {} (line {}, col {}): {} (near '{}')",
            self.offset, self.span.line, self.span.col, self.message, self.snippet
        )
    }
}

fn snippet_at(source: &str, offset: usize) -> String {
    let clamped = offset.min(source.len());
    // Snap to the nearest char boundary so slicing never panics.
    let start = (0..=clamped)
        .rev()
        .find(|i| source.is_char_boundary(*i))
        .unwrap_or(0);
    let rest = &source[start..];
    if rest.is_empty() {
        "<end of plan>".to_string()
    } else {
        rest.chars().take(24).collect()
    }
}
