// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI ("Companion Intelligence") provider adapters.
//!
//! A provider is an opaque query callback: prompt in, response out. The
//! daemon owns a [`ProviderRegistry`]; executors reach it through the
//! `/api/ci/query` endpoint rather than talking to providers directly.

mod command;
mod echo;

pub use command::CommandProvider;
pub use echo::EchoProvider;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    Unknown(String),

    #[error("provider {provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("provider {provider} timed out")]
    Timeout { provider: String },

    #[error("provider {provider} failed: {message}")]
    Failed { provider: String, message: String },
}

/// One AI provider behind an opaque query callback.
#[async_trait]
pub trait CiProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run one query to completion.
    async fn query(&self, prompt: &str, model: Option<&str>) -> Result<String, ProviderError>;
}

/// Name → provider lookup with a default.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CiProvider>>,
    default: String,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `echo` provider as default.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EchoProvider::new()));
        registry.default = "echo".to_string();
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn CiProvider>) {
        if self.default.is_empty() {
            self.default = provider.name().to_string();
        }
        self.providers
            .insert(provider.name().to_string(), provider);
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = name.into();
    }

    /// Resolve a provider by name; `None`/empty means the default.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn CiProvider>, ProviderError> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => self.default.as_str(),
        };
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CiProvider, ProviderError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted provider for tests: pops canned replies, records prompts.
    #[derive(Clone, Default)]
    pub struct FakeProvider {
        replies: Arc<Mutex<VecDeque<String>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl FakeProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_reply(&self, reply: impl Into<String>) {
            self.replies.lock().push_back(reply.into());
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl CiProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn query(
            &self,
            prompt: &str,
            _model: Option<&str>,
        ) -> Result<String, ProviderError> {
            self.prompts.lock().push(prompt.to_string());
            // Out of scripted replies: echo the prompt back.
            Ok(self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| format!("fake: {prompt}")))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProvider;

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
