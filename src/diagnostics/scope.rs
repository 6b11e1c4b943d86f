//! Lexical scope stack for one analysis pass.

use std::collections::HashMap;

use crate::types::TypeInfo;

/// Variable bindings, innermost frame last. Entering a block copies the
/// current frame, so bindings made inside a block vanish when it is left.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, TypeInfo>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A stack holding only the file-level frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        let top = self.frames.last().cloned().unwrap_or_default();
        self.frames.push(top);
    }

    /// Leave the innermost block. The file-level frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: TypeInfo) {
        if let Some(top) = self.frames.last_mut() {
            top.insert(name.into(), ty);
        }
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&TypeInfo> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
