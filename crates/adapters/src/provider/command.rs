// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-backed provider: prompt on stdin, response on stdout.

use super::{CiProvider, ProviderError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Default timeout for CI provider commands.
pub const PROVIDER_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Provider that shells out to a local CLI (e.g. a `claude -p`-style
/// binary). The prompt is written to the child's stdin; stdout is the
/// response. The model, when given, is passed as `--model <name>`.
pub struct CommandProvider {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            timeout: PROVIDER_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CiProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, prompt: &str, model: Option<&str>) -> Result<String, ProviderError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(model) = model {
            cmd.arg("--model").arg(model);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| ProviderError::Unavailable {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| ProviderError::Failed {
                    provider: self.name.clone(),
                    message: format!("writing prompt: {e}"),
                })?;
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: self.name.clone(),
            })?
            .map_err(|e| ProviderError::Failed {
                provider: self.name.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ProviderError::Failed {
                provider: self.name.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(provider = %self.name, bytes = output.stdout.len(), "provider reply");
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}
