//! Lexically scoped variable storage.
//!
//! Each scope owns one [`Environment`]; nested scopes chain to their
//! enclosing scope through a shared `Rc<RefCell<_>>` handle. Closures
//! keep the defining scope alive by holding their own handle to it, so
//! a chain can outlive the block that created it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One scope's name-to-value bindings, plus a link to the scope that
/// encloses it (`None` for the globals).
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A fresh global scope with no enclosing environment.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A nested scope chained to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Binds `name` in this scope, shadowing any binding of the same
    /// name further out. Re-declaring in the same scope just
    /// overwrites, which is what makes REPL redefinition work.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{name}' = {value}");

        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up through the scope chain, innermost first.
    ///
    /// `line` only feeds the error report for the undefined case.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{name}'."),
            ))
        }
    }

    /// Rebinds an existing variable, walking outward to find the scope
    /// that declared it. Unlike [`define`](Self::define) this never
    /// creates a binding: assigning to an undeclared name is an error.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);

            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{name}'."),
            ))
        }
    }
}
