// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow id generation and helpers

use crate::clock::Clock;
use crate::limits::MAX_WORKFLOW_ID_LEN;

/// Trait for truncating identifiers to a short prefix.
pub trait ShortId {
    /// Returns a string slice truncated to at most `n` characters.
    fn short(&self, n: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, n: usize) -> &str {
        if self.len() <= n {
            self
        } else {
            &self[..n]
        }
    }
}

/// Unique identifier for a workflow instance.
///
/// Two forms exist: clock-derived `wf_<sec>_<usec>` ids for anonymous
/// starts, and `<template>_<instance>` ids when the caller names the
/// instance. Both are capped at [`MAX_WORKFLOW_ID_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocate a `wf_<sec>_<usec>` id from the clock.
    ///
    /// The microsecond component is the sub-second remainder, so two
    /// allocations within the same microsecond collide — the registry's
    /// duplicate check is the backstop.
    pub fn allocate(clock: &dyn Clock) -> Self {
        let us = clock.epoch_us();
        Self(format!("wf_{}_{}", us / 1_000_000, us % 1_000_000))
    }

    /// Build a `<template>_<instance>` id from caller-supplied names.
    pub fn from_parts(template: &str, instance: &str) -> Self {
        let mut id = format!(
            "{}_{}",
            sanitize_instance_id(template),
            sanitize_instance_id(instance)
        );
        id.truncate(MAX_WORKFLOW_ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a string slice truncated to at most `n` characters.
    pub fn short(&self, n: usize) -> &str {
        self.0.short(n)
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkflowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for WorkflowId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WorkflowId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for WorkflowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reduce a user-supplied name to id-safe characters.
///
/// Alphanumerics, `-` and `_` pass through; everything else becomes `-`.
/// Empty input becomes `"x"` so joined ids never collapse segments.
pub fn sanitize_instance_id(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "x".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
