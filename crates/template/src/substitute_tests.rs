// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn ctx(pairs: &[(&str, &str)]) -> WorkflowContext {
    pairs.iter().copied().collect()
}

#[test]
fn basic_substitution() {
    let result = substitute("{a}-{b}", &ctx(&[("a", "1"), ("b", "2")]));
    assert_eq!(result, "1-2");
}

#[test]
fn unknown_placeholders_kept_literal() {
    assert_eq!(substitute("{x}", &ctx(&[])), "{x}");
    assert_eq!(
        substitute("{known} and {unknown}", &ctx(&[("known", "yes")])),
        "yes and {unknown}"
    );
}

#[test]
fn no_recursive_re_expansion() {
    // A substituted value containing a placeholder is not expanded again.
    let result = substitute("{a}", &ctx(&[("a", "{b}"), ("b", "boom")]));
    assert_eq!(result, "{b}");
}

#[test]
fn left_to_right_single_pass() {
    let result = substitute(
        "start {a} mid {a} end",
        &ctx(&[("a", "v")]),
    );
    assert_eq!(result, "start v mid v end");
}

#[parameterized(
    empty_template = { "", "" },
    no_placeholders = { "plain text", "plain text" },
    unmatched_open = { "{notclosed", "{notclosed" },
    unmatched_close = { "notopened}", "notopened}" },
    empty_braces = { "{}", "{}" },
    digit_start = { "{1abc}", "{1abc}" },
    nested_braces = { "{{a}}", "{v}" },
)]
fn edge_cases(template: &str, expected: &str) {
    assert_eq!(substitute(template, &ctx(&[("a", "v")])), expected);
}

#[test]
fn underscore_names_work() {
    let result = substitute(
        "{workflow_id}/{_private}",
        &ctx(&[("workflow_id", "wf_1_2"), ("_private", "p")]),
    );
    assert_eq!(result, "wf_1_2/p");
}

#[test]
fn value_may_contain_regex_specials() {
    let result = substitute("{v}", &ctx(&[("v", "$1 \\d ${x}")]));
    assert_eq!(result, "$1 \\d ${x}");
}
