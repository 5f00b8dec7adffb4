//! Execution error taxonomy
//!
//! Everything here is fatal for the current plan execution. Syntax problems
//! never reach the runtime (the validator gates them); what remains are
//! configuration defects (lookup, arity) and genuine runtime failures
//! (unset variables, type mismatches, skill failures). None of these are
//! retried by the runtime — a physical agent should stop, not guess.

use minispec_core::CmpOp;
use thiserror::Error;

/// Fatal execution error for one plan run.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The abbreviation resolved in neither registry tier.
    #[error("skill '{abbrev}' is not registered in either tier")]
    UnknownSkill { abbrev: String },

    /// Registration defect: the abbreviation would resolve in both tiers.
    #[error("skill '{abbrev}' is already registered; tiers must stay disjoint")]
    DuplicateSkill { abbrev: String },

    #[error("skill '{abbrev}' expects {expected} argument(s), got {got}")]
    Arity {
        abbrev: String,
        expected: usize,
        got: usize,
    },

    #[error("variable '{0}' referenced before assignment")]
    MissingVariable(String),

    #[error("cannot compare {lhs} {op} {rhs}")]
    TypeMismatch {
        op: CmpOp,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// The skill itself failed (motor fault, perception unavailable, ...).
    #[error("skill '{abbrev}' failed: {source}")]
    Skill {
        abbrev: String,
        #[source]
        source: anyhow::Error,
    },
}
