//! AST for the MiniSpec plan language
//!
//! MiniSpec is a token-economical language for LLM-generated robot plans:
//! single-letter skill abbreviations, comma-separated arguments, `;` between
//! statements, `{}` blocks. The AST mirrors that surface directly:
//!
//! - **Literals**: terminal values (booleans, numbers, single-quoted strings)
//! - **Operands**: a literal or a `_N` variable reference
//! - **Statements**: skill calls, assignments, conditionals, counted loops,
//!   and early returns
//!
//! A parsed [`Plan`] is immutable and keeps its source text so diagnostics
//! and logs can always point back at what the model actually wrote.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// PLAN
// =============================================================================

/// A complete parsed plan: an ordered sequence of statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub statements: Vec<Statement>,
    /// Original source text, retained for diagnostics and logging.
    pub source: String,
}

impl Plan {
    /// Render the plan back to MiniSpec source.
    ///
    /// Re-parsing the rendered text yields an identical statement sequence.
    pub fn to_source(&self) -> String {
        self.statements
            .iter()
            .map(Statement::to_source)
            .collect::<Vec<_>>()
            .join(";")
    }
}

// =============================================================================
// STATEMENTS
// =============================================================================

/// A single statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Bare skill call: `s,apple`
    Call(SkillCall),
    /// Assignment of a call result: `_1=s,apple`
    Assign { var: String, call: SkillCall },
    /// Conditional block: `?_1==True{...}` (no else branch)
    Conditional {
        cond: Comparison,
        body: Vec<Statement>,
    },
    /// Counted loop: `8{...}`
    Loop { count: u32, body: Vec<Statement> },
    /// Early return: `->True`. Terminates the whole plan at any depth.
    Return(Literal),
}

impl Statement {
    /// Render the statement back to MiniSpec source.
    pub fn to_source(&self) -> String {
        match self {
            Statement::Call(call) => call.to_source(),
            Statement::Assign { var, call } => format!("{}={}", var, call.to_source()),
            Statement::Conditional { cond, body } => {
                format!("?{}{{{}}}", cond.to_source(), render_block(body))
            }
            Statement::Loop { count, body } => format!("{}{{{}}}", count, render_block(body)),
            Statement::Return(lit) => format!("->{}", lit.to_source()),
        }
    }
}

fn render_block(body: &[Statement]) -> String {
    body.iter()
        .map(Statement::to_source)
        .collect::<Vec<_>>()
        .join(";")
}

/// A skill invocation: abbreviation plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCall {
    pub abbrev: String,
    pub args: Vec<Operand>,
}

impl SkillCall {
    pub fn to_source(&self) -> String {
        let mut out = self.abbrev.clone();
        for arg in &self.args {
            out.push(',');
            out.push_str(&arg.to_source());
        }
        out
    }
}

// =============================================================================
// OPERANDS AND LITERALS
// =============================================================================

/// A value position: literal or variable reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Literal),
    /// Variable reference: `_1`, `_2`, ...
    Var(String),
}

impl Operand {
    pub fn to_source(&self) -> String {
        match self {
            Operand::Literal(lit) => lit.to_source(),
            Operand::Var(name) => name.clone(),
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Literal {
    pub fn to_source(&self) -> String {
        match self {
            Literal::Bool(true) => "True".to_string(),
            Literal::Bool(false) => "False".to_string(),
            Literal::Number(n) => format_number(*n),
            Literal::Str(s) => format!("'{}'", s),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

/// Integers render without a trailing `.0` so rendered plans stay minimal.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// =============================================================================
// COMPARISONS
// =============================================================================

/// A comparison guarding a conditional block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub lhs: Operand,
    pub op: CmpOp,
    pub rhs: Operand,
}

impl Comparison {
    pub fn to_source(&self) -> String {
        format!(
            "{}{}{}",
            self.lhs.to_source(),
            self.op,
            self.rhs.to_source()
        )
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        };
        f.write_str(s)
    }
}
