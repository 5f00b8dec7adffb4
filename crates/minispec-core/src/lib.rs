//! minispec-core: the MiniSpec plan language
//!
//! This crate contains the pure language logic with no runtime or network
//! dependencies:
//! - AST types (Plan, Statement, SkillCall, Literal, Comparison)
//! - Nom-based parser for the terse plan syntax
//! - Diagnostic types for error reporting
//! - Syntax validator that reduces parse failures into prompt-ready
//!   diagnostics
//!
//! Execution (variable store, skill dispatch, interpreter) lives in
//! minispec-runtime; the LLM planning loop lives in minispec-agentic.

pub mod ast;
pub mod diagnostics;
pub mod parser;
pub mod validator;

// Re-export commonly used types
pub use ast::{CmpOp, Comparison, Literal, Operand, Plan, SkillCall, Statement};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, SourceSpan};
pub use parser::{parse_plan, ParseError};
pub use validator::check_syntax;
