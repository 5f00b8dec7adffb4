//! Syntax validator for model-emitted plans
//!
//! [`check_syntax`] is the gate between the language model and the
//! interpreter: it is called speculatively on every model response before
//! anything executes. It is pure — no skill dispatch, no network, no state —
//! which is what makes the speculative call safe.
//!
//! Validation runs in two phases:
//!
//! 1. A character walk checking block/quote balance. This catches the most
//!    common model failure (a dropped `}`) with a precise position before
//!    the parser's recursive machinery gets involved.
//! 2. The full parser. Any [`ParseError`](crate::parser::ParseError) is
//!    reduced to a [`Diagnostic`].
//!
//! An empty result means the text is a valid plan and `parse_plan` will
//! succeed on it.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::parser::parse_plan;

/// Check plan source for syntax errors. Empty result = valid.
pub fn check_syntax(source: &str) -> Vec<Diagnostic> {
    let diagnostics = scan_balance(source);
    if !diagnostics.is_empty() {
        tracing::debug!(count = diagnostics.len(), "balance scan rejected plan");
        return diagnostics;
    }

    match parse_plan(source) {
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::debug!(offset = e.offset, expected = %e.expected, "parse rejected plan");
            vec![Diagnostic::error(
                source,
                DiagnosticCode::SyntaxError,
                e.offset,
                format!("expected {}", e.expected),
            )]
        }
    }
}

/// Walk the source once, checking `{`/`}` balance and string closure.
///
/// Braces inside string literals don't count toward nesting.
fn scan_balance(source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut open_braces: Vec<usize> = Vec::new();
    let mut string_open: Option<usize> = None;

    for (pos, ch) in source.char_indices() {
        if string_open.is_some() {
            if ch == '\'' {
                string_open = None;
            }
            continue;
        }
        match ch {
            '\'' => string_open = Some(pos),
            '{' => open_braces.push(pos),
            '}' => {
                if open_braces.pop().is_none() {
                    diagnostics.push(Diagnostic::error(
                        source,
                        DiagnosticCode::UnbalancedBlock,
                        pos,
                        "'}' without a matching '{'",
                    ));
                }
            }
            _ => {}
        }
    }

    if let Some(pos) = string_open {
        diagnostics.push(Diagnostic::error(
            source,
            DiagnosticCode::UnclosedString,
            pos,
            "string literal is never closed",
        ));
    }
    for pos in open_braces {
        diagnostics.push(Diagnostic::error(
            source,
            DiagnosticCode::UnbalancedBlock,
            pos,
            "block opened here is never closed",
        ));
    }

    diagnostics
}
