use indexmap::IndexMap;

use crate::errors::{ErrorKind, ScriptError};
use crate::value::Value;

/// A single name binding: the value plus its staticness. Static bindings
/// cannot be rebound without `force`.
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub is_static: bool,
}

/// One level of name bindings, stacked per function call. Insertion order
/// is preserved so namespaces enumerate deterministically.
#[derive(Debug, Default)]
pub struct Scope {
    vars: IndexMap<String, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            vars: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Bind `name`, enforcing the static-rebinding rule for this scope.
    pub fn set(
        &mut self,
        name: &str,
        value: Value,
        is_static: bool,
        line: usize,
    ) -> Result<(), ScriptError> {
        if let Some(existing) = self.vars.get(name) {
            if existing.is_static {
                return Err(ScriptError::new(
                    ErrorKind::Static,
                    line,
                    format!("Variable '{}' is static and cannot be changed", name),
                ));
            }
        }
        self.vars
            .insert(name.to_string(), Binding { value, is_static });
        Ok(())
    }

    /// Bind `name` without the static check. Used by the bootstrap and by
    /// the try/catch `error` lifecycle only.
    pub fn force_set(&mut self, name: &str, value: Value, is_static: bool) {
        self.vars
            .insert(name.to_string(), Binding { value, is_static });
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.vars.shift_remove(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
