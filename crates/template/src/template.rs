// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow template model and JSON loading.
//!
//! Templates are declarative JSON: an ordered list of steps, each tagged
//! by `type`. Loading enforces hard bounds (file size, step count, JSON
//! nesting depth) before anything is interpreted, so a hostile template
//! cannot exhaust the executor.

use argo_core::limits::{MAX_TEMPLATE_BYTES, MAX_TEMPLATE_DEPTH, MAX_TEMPLATE_STEPS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Template errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("template has {count} steps (max {max})")]
    TooManySteps { count: usize, max: usize },

    #[error("template nesting exceeds depth {max}")]
    TooDeep { max: usize },

    #[error("template has no steps")]
    Empty,

    #[error("invalid template JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("step id is empty")]
    EmptyStepId,

    #[error("duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("step {step} references unknown step: {target}")]
    UnknownTarget { step: String, target: String },
}

/// A workflow template: an ordered step graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

/// One node in the template's step graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(flatten)]
    pub kind: StepKind,
    /// Explicit successor; linear fallthrough to the next listed step
    /// when absent. Ignored for `branch` (which names its own targets)
    /// and `exit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

/// Step payload, dispatched on the JSON `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// One-shot AI query: substitute the prompt, query the provider,
    /// capture the response into a context variable.
    Prompt {
        prompt: String,
        save_to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persona: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Interactive chat round-tripping user input through the daemon.
    CiChat {
        #[serde(default)]
        greeting: String,
        prompt: String,
        save_to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Conditional jump: evaluate `condition` over the context and
    /// continue at `if_true` or `if_false`.
    Branch {
        condition: String,
        if_true: String,
        if_false: String,
    },
    /// Assign a literal or interpolated value into the context.
    Set { name: String, value: String },
    /// Stop the workflow.
    Exit,
}

impl WorkflowTemplate {
    /// Load and validate a template from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_TEMPLATE_BYTES {
            return Err(TemplateError::TooLarge {
                size,
                max: MAX_TEMPLATE_BYTES,
            });
        }

        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    /// Parse and validate a template from a JSON string.
    pub fn parse(data: &str) -> Result<Self, TemplateError> {
        if data.len() as u64 > MAX_TEMPLATE_BYTES {
            return Err(TemplateError::TooLarge {
                size: data.len() as u64,
                max: MAX_TEMPLATE_BYTES,
            });
        }

        let value: serde_json::Value = serde_json::from_str(data)?;
        if json_depth(&value) > MAX_TEMPLATE_DEPTH {
            return Err(TemplateError::TooDeep {
                max: MAX_TEMPLATE_DEPTH,
            });
        }

        let template: WorkflowTemplate = serde_json::from_value(value)?;
        template.validate()?;
        Ok(template)
    }

    /// Structural validation: bounds, unique ids, resolvable targets.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.steps.is_empty() {
            return Err(TemplateError::Empty);
        }
        if self.steps.len() > MAX_TEMPLATE_STEPS {
            return Err(TemplateError::TooManySteps {
                count: self.steps.len(),
                max: MAX_TEMPLATE_STEPS,
            });
        }

        let mut ids = HashSet::new();
        for step in &self.steps {
            if step.id.is_empty() {
                return Err(TemplateError::EmptyStepId);
            }
            if !ids.insert(step.id.as_str()) {
                return Err(TemplateError::DuplicateStep(step.id.clone()));
            }
        }

        for step in &self.steps {
            let mut check = |target: &str| -> Result<(), TemplateError> {
                if ids.contains(target) {
                    Ok(())
                } else {
                    Err(TemplateError::UnknownTarget {
                        step: step.id.clone(),
                        target: target.to_string(),
                    })
                }
            };
            if let Some(next) = &step.next_step {
                check(next)?;
            }
            if let StepKind::Branch {
                if_true, if_false, ..
            } = &step.kind
            {
                check(if_true)?;
                check(if_false)?;
            }
        }
        Ok(())
    }

    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// The step listed after `id`, for linear fallthrough.
    pub fn step_after(&self, id: &str) -> Option<&Step> {
        let idx = self.steps.iter().position(|s| s.id == id)?;
        self.steps.get(idx + 1)
    }
}

/// Nesting depth of a JSON value (scalars are depth 1).
fn json_depth(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Array(items) => {
            1 + items.iter().map(json_depth).max().unwrap_or(0)
        }
        serde_json::Value::Object(map) => {
            1 + map.values().map(json_depth).max().unwrap_or(0)
        }
        _ => 1,
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
