//! minispec-runtime: execution engine for parsed plans
//!
//! Owns the runtime state of one plan execution — the variable store and
//! the two-tier skill registry — and the interpreter that walks the AST.
//! Skill bodies stay host concerns behind the [`Skill`] trait; this crate
//! only defines how they are resolved and called.

pub mod error;
pub mod interpreter;
pub mod registry;
pub mod store;
pub mod value;

// Re-exports for convenience
pub use error::ExecError;
pub use interpreter::{execute, execute_with_store, Flow};
pub use registry::{FnSkill, Skill, SkillRegistry, SkillTier};
pub use store::VariableStore;
pub use value::{compare, Value};
