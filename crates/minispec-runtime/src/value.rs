//! Runtime values and comparison semantics
//!
//! Plan values are dynamically typed: a skill may return a boolean, a
//! number, a string, or nothing. Comparison rules are explicit per tag
//! pair — there is no implicit coercion, and comparing incompatible types
//! is an execution error rather than a silent `false`.

use minispec_core::{CmpOp, Literal};
use std::fmt;

use crate::error::ExecError;

/// A dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Produced by skills with no meaningful result.
    None,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::from(&lit)
    }
}

/// Evaluate `lhs op rhs` with per-type-pair rules.
///
/// Booleans support equality only; numbers and strings support equality
/// and ordering (lexicographic for strings). Everything else is a
/// [`ExecError::TypeMismatch`].
pub fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, ExecError> {
    let mismatch = || ExecError::TypeMismatch {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => match op {
            CmpOp::Eq => Ok(a == b),
            CmpOp::Ne => Ok(a != b),
            _ => Err(mismatch()),
        },
        (Value::Number(a), Value::Number(b)) => Ok(match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Gt => a > b,
            CmpOp::Lt => a < b,
            CmpOp::Ge => a >= b,
            CmpOp::Le => a <= b,
        }),
        (Value::Str(a), Value::Str(b)) => Ok(match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Gt => a > b,
            CmpOp::Lt => a < b,
            CmpOp::Ge => a >= b,
            CmpOp::Le => a <= b,
        }),
        _ => Err(mismatch()),
    }
}
