//! Custom operands (`@name`)
//!
//! A condition operand may be computed by the host instead of read from
//! memory. The host registers a [`CustomOperandEvaluator`] in
//! [`ParseOptions`](crate::ParseOptions); the parser rejects `@name`
//! operands the evaluator does not know, so evaluation never meets an
//! unresolved name.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::memory::Peek;

/// Host capability that computes named operands.
pub trait CustomOperandEvaluator: Send + Sync {
    /// Whether `name` can be evaluated. Checked once at parse time.
    fn has_function(&self, name: &str) -> bool;

    /// Compute the operand for this frame. Unknown names evaluate to 0.
    fn evaluate(&self, name: &str, peek: &mut dyn Peek) -> u32;
}

type CustomFn = dyn Fn(&mut dyn Peek) -> u32 + Send + Sync;

/// Evaluator backed by a table of Rust closures.
#[derive(Default, Clone)]
pub struct FunctionTable {
    functions: HashMap<String, Arc<CustomFn>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&mut dyn Peek) -> u32 + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CustomOperandEvaluator for FunctionTable {
    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn evaluate(&self, name: &str, peek: &mut dyn Peek) -> u32 {
        self.functions.get(name).map_or(0, |function| function(peek))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlock;

    #[test]
    fn test_function_table_evaluates_registered_function() {
        let mut table = FunctionTable::new();
        table.register("test", |peek: &mut dyn Peek| peek.peek(0, 4));

        let ram = [0x00, 0x12, 0x34, 0xAB, 0x56];
        let mut memory = MemoryBlock::new(&ram);

        assert!(table.has_function("test"));
        assert!(!table.has_function("other"));
        assert_eq!(table.evaluate("test", &mut memory), 0xAB341200);
        assert_eq!(table.evaluate("other", &mut memory), 0);
    }
}
