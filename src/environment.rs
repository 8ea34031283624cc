use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures, bound methods and call frames alias
/// the same frame, so a write through one handle is seen by all of them.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its bindings plus a link to the enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Look `name` up along the whole chain, innermost first.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite the nearest existing binding of `name`.  Returns `false` when
    /// no scope on the chain declares it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Walk exactly `distance` enclosing links up from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the scope exactly `distance` hops up.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    let scope: EnvRef = ancestor(env, distance)?;
    let value: Option<Value> = scope.borrow().get_local(name);

    debug!(
        "get_at(distance={}, name={}) -> found={}",
        distance,
        name,
        value.is_some()
    );

    value
}

/// Write `name` into the scope exactly `distance` hops up.  Returns `false`
/// when that scope does not hold the name.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    match ancestor(env, distance) {
        Some(scope) => {
            let mut scope = scope.borrow_mut();
            if scope.contains(name) {
                scope.define(name, value);
                true
            } else {
                false
            }
        }
        None => false,
    }
}
