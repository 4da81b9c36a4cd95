use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use super::VariableSpec;
use crate::error::{CompileError, Result};

/// A frozen copy of one scope, kept after the scope itself has been exited.
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshot {
    vars: Rc<HashMap<String, VariableSpec>>,
}

impl ScopeSnapshot {
    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Stack of name → spec scopes. Lookups walk from the innermost scope out.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, VariableSpec>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
        debug!("entered scope {}", self.scopes.len());
    }

    pub fn exit_scope(&mut self) -> Result<()> {
        match self.scopes.pop() {
            Some(_) => {
                debug!("exited scope {}", self.scopes.len() + 1);
                Ok(())
            }
            None => Err(CompileError::internal("exit_scope called with no open scope")),
        }
    }

    /// Defines `spec` in the innermost scope.
    pub fn define(&mut self, spec: VariableSpec) -> Result<()> {
        let scope = self.scopes.last_mut().ok_or_else(|| {
            CompileError::internal(format!("define {} called with no open scope", spec.name))
        })?;
        if scope.contains_key(&spec.name) {
            return Err(CompileError::semantic(format!(
                "variable {} redefined",
                spec.name
            )));
        }
        scope.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Looks `name` up in the innermost scope only.
    pub fn get_local(&self, name: &str) -> Option<&VariableSpec> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    pub fn snapshot(&self) -> Result<ScopeSnapshot> {
        let scope = self
            .scopes
            .last()
            .ok_or_else(|| CompileError::internal("snapshot called with no open scope"))?;
        Ok(ScopeSnapshot {
            vars: Rc::new(scope.clone()),
        })
    }
}
