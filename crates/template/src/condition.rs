// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Branch-step condition evaluation.
//!
//! Conditions are deliberately tiny: `var == literal`, `var != literal`,
//! bare `var` (non-empty test) and `!var`. No nesting, no boolean
//! operators — a branch chain in the template expresses anything more.

use crate::context::WorkflowContext;
use thiserror::Error;

/// Condition errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("empty condition")]
    Empty,

    #[error("invalid condition: {0}")]
    Invalid(String),
}

/// Evaluate a branch condition against the context.
///
/// The left-hand side names a context variable (missing variables read as
/// empty); the right-hand side is a literal, with optional single or
/// double quotes stripped. Truthiness for bare variables: non-empty and
/// neither `"false"` nor `"0"`.
pub fn evaluate_condition(expr: &str, ctx: &WorkflowContext) -> Result<bool, ConditionError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(ConditionError::Empty);
    }

    if let Some((lhs, rhs)) = split_operator(expr, "==") {
        return Ok(lookup(ctx, lhs)? == unquote(rhs));
    }
    if let Some((lhs, rhs)) = split_operator(expr, "!=") {
        return Ok(lookup(ctx, lhs)? != unquote(rhs));
    }
    if let Some(name) = expr.strip_prefix('!') {
        return Ok(!truthy(&lookup(ctx, name.trim())?));
    }
    Ok(truthy(&lookup(ctx, expr)?))
}

fn split_operator<'a>(expr: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    expr.split_once(op)
}

fn lookup(ctx: &WorkflowContext, name: &str) -> Result<String, ConditionError> {
    let name = name.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ConditionError::Invalid(name.to_string()));
    }
    Ok(ctx.get(name).unwrap_or_default().to_string())
}

fn unquote(literal: &str) -> &str {
    let literal = literal.trim();
    let stripped = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            literal
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        });
    stripped.unwrap_or(literal)
}

fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "false" && value != "0"
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
