// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn env_pairs_parse_into_map() {
    let env = parse_env_pairs(&[
        "FOO=bar".to_string(),
        "EMPTY=".to_string(),
        "WITH_EQ=a=b".to_string(),
    ])
    .unwrap();
    assert_eq!(env.get("FOO").map(String::as_str), Some("bar"));
    assert_eq!(env.get("EMPTY").map(String::as_str), Some(""));
    // Only the first '=' splits.
    assert_eq!(env.get("WITH_EQ").map(String::as_str), Some("a=b"));
}

#[parameterized(
    no_equals = { "JUSTAKEY" },
    empty_key = { "=value" },
)]
fn bad_env_pairs_are_rejected(pair: &str) {
    assert!(parse_env_pairs(&[pair.to_string()]).is_err());
}
