// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variable substitution for `{name}` placeholders.

use crate::context::WorkflowContext;
use regex::Regex;
use std::sync::LazyLock;

/// Regex pattern for `{variable_name}`
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// Substitute `{name}` placeholders from the context.
///
/// Resolution is a single left-to-right pass: substituted values are never
/// re-scanned, so a value containing `{other}` stays literal and total work
/// is bounded by the template length. Unknown names are kept as-is.
pub fn substitute(template: &str, ctx: &WorkflowContext) -> String {
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            match caps.get(1).and_then(|name| ctx.get(name.as_str())) {
                Some(value) => value.to_string(),
                None => caps
                    .get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            }
        })
        .to_string()
}

#[cfg(test)]
#[path = "substitute_tests.rs"]
mod tests;
