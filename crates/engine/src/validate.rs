// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn preconditions: script path hygiene and environment denylist.
//!
//! Executors run user-named templates with user-supplied environment
//! overrides. The path rules reject traversal and shell metacharacters
//! before anything is spawned; the env rules keep loader-interposition
//! variables out of the sanitized child environment.

use crate::error::EngineError;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Environment variables never forwarded to executors.
const ENV_DENYLIST: &[&str] = &["LD_PRELOAD", "LD_LIBRARY_PATH", "PATH", "IFS"];

/// Prefixes of denied environment variables.
const ENV_DENYLIST_PREFIXES: &[&str] = &["DYLD_"];

/// Characters excluded from script paths (on top of requiring printable
/// ASCII). Newline is covered by the printable check.
const PATH_EXCLUDED: &[char] = &[';', '&', '|', '$', '`', '<', '>'];

/// Validate a script/template path for spawning.
///
/// The path must be absolute, contain no `..` segments, and consist of
/// printable ASCII excluding shell metacharacters.
pub fn validate_script_path(raw: &str) -> Result<PathBuf, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::InvalidPath("empty path".to_string()));
    }

    for c in raw.chars() {
        let printable = (' '..='~').contains(&c);
        if !printable || PATH_EXCLUDED.contains(&c) {
            return Err(EngineError::InvalidPath(format!(
                "illegal character {c:?} in path"
            )));
        }
    }

    let path = Path::new(raw);
    if !path.is_absolute() {
        return Err(EngineError::InvalidPath(format!(
            "path must be absolute: {raw}"
        )));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(EngineError::InvalidPath(format!(
            "path must not contain '..': {raw}"
        )));
    }

    Ok(path.to_path_buf())
}

/// Validate environment overrides against the denylist.
pub fn validate_env(env: &HashMap<String, String>) -> Result<(), EngineError> {
    for key in env.keys() {
        let well_formed = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !key.chars().next().is_some_and(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(EngineError::InvalidEnv(key.clone()));
        }

        let denied = ENV_DENYLIST.contains(&key.as_str())
            || ENV_DENYLIST_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix));
        if denied {
            return Err(EngineError::DeniedEnv(key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
