//! Variable store for one plan execution
//!
//! Plan variables (`_1`, `_2`, ...) live exactly as long as one execution.
//! Assignment overwrites; reading an unset name is a fatal execution error.

use std::collections::HashMap;

use crate::error::ExecError;
use crate::value::Value;

/// Named values for a single plan execution.
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, overwriting any prior binding.
    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    /// Look up `name`, erroring if it was never assigned.
    pub fn get(&self, name: &str) -> Result<Value, ExecError> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| ExecError::MissingVariable(name.to_string()))
    }
}
