//! Environment for variable bindings
//!
//! Scopes live in one vector and are created and discarded in strict stack
//! order. Each scope also records the scope it was pushed under, and the
//! "current" scope can be redirected (for instance to the global scope)
//! without touching the stack. Function calls use this to see only globals
//! plus their own bindings, never the caller's locals.

use super::Value;
use super::error::{InterpResult, RuntimeError};
use std::collections::HashMap;

/// Index of a scope in the environment
pub type EnvId = usize;

#[derive(Debug)]
struct Frame {
    bindings: HashMap<String, Value>,
    parent: Option<EnvId>,
}

/// Chain of scopes with an addressable current scope
#[derive(Debug)]
pub struct Environment {
    /// Physical scope stack, index 0 is global
    frames: Vec<Frame>,
    /// Scope that lookups start from
    current: EnvId,
}

impl Environment {
    /// The outermost scope
    pub const GLOBAL: EnvId = 0;

    pub fn new() -> Self {
        Environment {
            frames: vec![Frame {
                bindings: HashMap::new(),
                parent: None,
            }],
            current: Self::GLOBAL,
        }
    }

    /// Push a new scope under the current one and make it current
    pub fn push(&mut self) -> EnvId {
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = self.frames.len() - 1;
        self.current
    }

    /// Discard the current scope; its parent becomes current
    pub fn pop(&mut self) -> InterpResult<()> {
        if self.current == Self::GLOBAL || self.current + 1 != self.frames.len() {
            return Err(RuntimeError::internal(format!(
                "scope {} popped out of order (depth {})",
                self.current,
                self.frames.len()
            )));
        }
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| RuntimeError::internal("scope stack empty"))?;
        self.current = frame.parent.unwrap_or(Self::GLOBAL);
        Ok(())
    }

    pub fn current_id(&self) -> EnvId {
        self.current
    }

    /// Redirect lookups without altering the scope stack
    pub fn set_current_id(&mut self, id: EnvId) -> InterpResult<()> {
        if id >= self.frames.len() {
            return Err(RuntimeError::internal(format!("no scope with id {id}")));
        }
        self.current = id;
        Ok(())
    }

    /// Number of live scopes
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop every scope above `depth` and make `current` the current scope.
    /// Leaves a call correctly even when its body bailed out mid-block.
    pub fn unwind_to(&mut self, depth: usize, current: EnvId) -> InterpResult<()> {
        if depth == 0 || depth > self.frames.len() || current >= depth {
            return Err(RuntimeError::internal(format!(
                "cannot unwind to depth {depth} with scope {current} (depth {})",
                self.frames.len()
            )));
        }
        self.frames.truncate(depth);
        self.current = current;
        Ok(())
    }

    /// Introduce a binding slot (initially nil) in the current scope.
    /// Redeclaring simply rebinds.
    pub fn declare(&mut self, name: &str) {
        self.frames[self.current]
            .bindings
            .insert(name.to_string(), Value::Nil);
    }

    /// Declare and bind in the current scope
    pub fn define(&mut self, name: &str, value: Value) {
        self.frames[self.current]
            .bindings
            .insert(name.to_string(), value);
    }

    /// Rebind in the nearest enclosing scope that declares `name`
    pub fn set(&mut self, name: &str, value: Value) -> InterpResult<()> {
        let id = self
            .resolve(name)
            .ok_or_else(|| RuntimeError::undefined_variable(name))?;
        self.frames[id].bindings.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> InterpResult<Value> {
        self.resolve(name)
            .and_then(|id| self.frames[id].bindings.get(name).cloned())
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    fn resolve(&self, name: &str) -> Option<EnvId> {
        let mut id = Some(self.current);
        while let Some(i) = id {
            let frame = &self.frames[i];
            if frame.bindings.contains_key(name) {
                return Some(i);
            }
            id = frame.parent;
        }
        None
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
