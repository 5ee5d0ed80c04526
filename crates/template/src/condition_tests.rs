// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn ctx() -> WorkflowContext {
    [
        ("branch", "main"),
        ("empty", ""),
        ("flag", "true"),
        ("off", "false"),
        ("zero", "0"),
    ]
    .into_iter()
    .collect()
}

#[parameterized(
    eq_true = { "branch == main", true },
    eq_false = { "branch == dev", false },
    eq_quoted = { "branch == \"main\"", true },
    eq_single_quoted = { "branch == 'main'", true },
    eq_missing_var = { "ghost == ", true },
    ne_true = { "branch != dev", true },
    ne_false = { "branch != main", false },
    truthy_nonempty = { "branch", true },
    truthy_empty = { "empty", false },
    truthy_false_literal = { "off", false },
    truthy_zero = { "zero", false },
    truthy_missing = { "ghost", false },
    negated_empty = { "!empty", true },
    negated_set = { "!flag", false },
    whitespace_tolerant = { "  branch   ==   main  ", true },
)]
fn evaluation(expr: &str, expected: bool) {
    assert_eq!(evaluate_condition(expr, &ctx()).unwrap(), expected);
}

#[test]
fn empty_condition_is_error() {
    assert_eq!(evaluate_condition("", &ctx()), Err(ConditionError::Empty));
    assert_eq!(
        evaluate_condition("   ", &ctx()),
        Err(ConditionError::Empty)
    );
}

#[test]
fn malformed_variable_names_rejected() {
    assert!(matches!(
        evaluate_condition("a b == c", &ctx()),
        Err(ConditionError::Invalid(_))
    ));
    assert!(matches!(
        evaluate_condition("$(rm) == x", &ctx()),
        Err(ConditionError::Invalid(_))
    ));
}
