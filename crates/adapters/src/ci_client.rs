// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor-side client for the daemon's CI query endpoint.
//!
//! The step driver never talks to a provider directly: prompt and chat
//! steps round-trip through `POST /api/ci/query` so the daemon stays the
//! single owner of provider configuration and credentials.

use crate::provider::ProviderError;
use serde::Deserialize;
use std::time::Duration;

/// CI queries may sit behind a slow model; allow generous time.
const QUERY_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    provider: String,
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct QueryErrorBody {
    #[serde(default)]
    error: String,
}

/// HTTP client for `POST {daemon_url}/api/ci/query`.
pub struct CiClient {
    client: reqwest::Client,
    daemon_url: String,
}

impl CiClient {
    pub fn new(daemon_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            daemon_url: daemon_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Run one query through the daemon.
    pub async fn query(
        &self,
        query: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, ProviderError> {
        let provider_name = provider.unwrap_or("").to_string();
        let body = serde_json::json!({
            "query": query,
            "provider": provider,
            "model": model,
        });

        let response = self
            .client
            .post(format!("{}/api/ci/query", self.daemon_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable {
                provider: provider_name.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<QueryErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ProviderError::Failed {
                provider: provider_name,
                message,
            });
        }

        let parsed: QueryResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::Failed {
                    provider: provider_name,
                    message: e.to_string(),
                })?;
        tracing::debug!(provider = %parsed.provider, "ci query answered");
        Ok(parsed.response)
    }
}
