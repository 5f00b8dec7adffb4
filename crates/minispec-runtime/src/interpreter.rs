//! Plan interpreter
//!
//! Walks a parsed plan statement by statement against the variable store and
//! skill registry. Execution is linear and synchronous from the plan's point
//! of view: each skill call is awaited before the next statement runs, and
//! there is no concurrency within one plan.
//!
//! Early return is modeled as data, not as an unwinding mechanism: every
//! block execution yields a [`Flow`], and `Flow::Return` propagates up
//! through any nesting depth until it terminates the whole program. A loop
//! body that returns stops the loop and the plan immediately.

use std::future::Future;
use std::pin::Pin;

use minispec_core::{Comparison, Operand, Plan, SkillCall, Statement};

use crate::error::ExecError;
use crate::registry::SkillRegistry;
use crate::store::VariableStore;
use crate::value::{compare, Value};

/// Control signal from executing a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fall through to the next statement; carries the block's last value.
    Next(Value),
    /// A `->` was hit: terminate the entire program with this value.
    Return(Value),
}

/// Execute a plan with a fresh variable store.
///
/// The result is the `->` value if one was reached, otherwise the value of
/// the last executed statement (or [`Value::None`] for an empty plan).
pub async fn execute(plan: &Plan, registry: &SkillRegistry) -> Result<Value, ExecError> {
    let mut store = VariableStore::new();
    execute_with_store(plan, registry, &mut store).await
}

/// Execute a plan against a caller-provided store (e.g. preset variables).
pub async fn execute_with_store(
    plan: &Plan,
    registry: &SkillRegistry,
    store: &mut VariableStore,
) -> Result<Value, ExecError> {
    tracing::debug!(statements = plan.statements.len(), "executing plan");
    match exec_block(&plan.statements, registry, store).await? {
        Flow::Next(v) | Flow::Return(v) => Ok(v),
    }
}

/// Execute a statement sequence. Boxed because blocks nest recursively.
fn exec_block<'a>(
    statements: &'a [Statement],
    registry: &'a SkillRegistry,
    store: &'a mut VariableStore,
) -> Pin<Box<dyn Future<Output = Result<Flow, ExecError>> + Send + 'a>> {
    Box::pin(async move {
        let mut last = Value::None;

        for statement in statements {
            match statement {
                Statement::Call(call) => {
                    last = eval_call(call, registry, store).await?;
                }
                Statement::Assign { var, call } => {
                    let value = eval_call(call, registry, store).await?;
                    tracing::debug!(var = %var, value = %value, "assign");
                    store.set(var, value.clone());
                    last = value;
                }
                Statement::Conditional { cond, body } => {
                    if eval_comparison(cond, store)? {
                        match exec_block(body, registry, store).await? {
                            Flow::Return(v) => return Ok(Flow::Return(v)),
                            Flow::Next(v) => last = v,
                        }
                    }
                    // No else branch in the language; false is a no-op.
                }
                Statement::Loop { count, body } => {
                    for iteration in 0..*count {
                        tracing::trace!(iteration, count, "loop iteration");
                        match exec_block(body, registry, store).await? {
                            Flow::Return(v) => return Ok(Flow::Return(v)),
                            Flow::Next(v) => last = v,
                        }
                    }
                }
                Statement::Return(lit) => {
                    let value = Value::from(lit);
                    tracing::debug!(value = %value, "early return");
                    return Ok(Flow::Return(value));
                }
            }
        }

        Ok(Flow::Next(last))
    })
}

async fn eval_call(
    call: &SkillCall,
    registry: &SkillRegistry,
    store: &VariableStore,
) -> Result<Value, ExecError> {
    let (tier, skill) = registry.resolve(&call.abbrev)?;

    if skill.arity() != call.args.len() {
        return Err(ExecError::Arity {
            abbrev: call.abbrev.clone(),
            expected: skill.arity(),
            got: call.args.len(),
        });
    }

    let mut args = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        args.push(eval_operand(arg, store)?);
    }

    tracing::debug!(abbrev = %call.abbrev, %tier, "invoking skill");
    skill
        .invoke(args)
        .await
        .map_err(|source| ExecError::Skill {
            abbrev: call.abbrev.clone(),
            source,
        })
}

fn eval_comparison(cond: &Comparison, store: &VariableStore) -> Result<bool, ExecError> {
    let lhs = eval_operand(&cond.lhs, store)?;
    let rhs = eval_operand(&cond.rhs, store)?;
    compare(cond.op, &lhs, &rhs)
}

fn eval_operand(operand: &Operand, store: &VariableStore) -> Result<Value, ExecError> {
    match operand {
        Operand::Literal(lit) => Ok(Value::from(lit)),
        Operand::Var(name) => store.get(name),
    }
}
