// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor-local workflow context.

use indexmap::IndexMap;

/// Ordered `name → value` mapping backing variable substitution.
///
/// Insertion order is preserved so context dumps and saved histories read
/// in the order values were produced.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    vars: IndexMap<String, String>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the standard variables every workflow starts with.
    pub fn seeded(workflow_id: &str, branch: &str, environment: &str) -> Self {
        let mut ctx = Self::new();
        ctx.set("workflow_id", workflow_id);
        ctx.set("branch", branch);
        ctx.set("environment", environment);
        ctx
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Append to an existing value (used for chat histories).
    pub fn append(&mut self, name: &str, suffix: &str) {
        match self.vars.get_mut(name) {
            Some(value) => value.push_str(suffix),
            None => {
                self.vars.insert(name.to_string(), suffix.to_string());
            }
        }
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WorkflowContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.set(k, v);
        }
        ctx
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
