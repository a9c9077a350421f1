//! Variable-binding registry: declared range variable → node that introduced it

use std::collections::HashMap;

use crate::error::TranslateError;
use crate::node::NodeId;

#[derive(Debug, Default)]
pub struct VariableBindings {
    bindings: HashMap<String, NodeId>,
}

impl VariableBindings {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, name: &str, node: NodeId) -> Result<(), TranslateError> {
        if self.bindings.contains_key(name) {
            return Err(TranslateError::DuplicateVariable(name.to_string()));
        }
        self.bindings.insert(name.to_string(), node);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<NodeId, TranslateError> {
        self.bindings
            .get(name)
            .copied()
            .ok_or_else(|| TranslateError::UnboundVariable(name.to_string()))
    }
}
