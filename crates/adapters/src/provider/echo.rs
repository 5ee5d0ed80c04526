// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Echo provider: returns the prompt verbatim.

use super::{CiProvider, ProviderError};
use async_trait::async_trait;

/// Deterministic built-in provider. Useful for wiring checks and for
/// workflows exercised without a real model behind them.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CiProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn query(&self, prompt: &str, _model: Option<&str>) -> Result<String, ProviderError> {
        Ok(prompt.to_string())
    }
}
