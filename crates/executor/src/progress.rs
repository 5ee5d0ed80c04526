// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress reporting to the daemon.

use std::time::Duration;
use tracing::debug;

/// Best-effort `POST /api/workflow/progress/{id}` reporter. A missed
/// report never fails a step; the daemon's view is merely stale.
pub struct ProgressReporter {
    inner: Option<Inner>,
}

struct Inner {
    client: reqwest::Client,
    url: String,
}

impl ProgressReporter {
    pub fn new(daemon_url: &str, workflow_id: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            inner: Some(Inner {
                client,
                url: format!(
                    "{}/api/workflow/progress/{}",
                    daemon_url.trim_end_matches('/'),
                    workflow_id
                ),
            }),
        }
    }

    /// Reporter that drops everything (driver unit tests).
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub async fn report(&self, current_step: u32, total_steps: u32, step_name: &str) {
        let Some(inner) = &self.inner else {
            return;
        };
        let body = serde_json::json!({
            "current_step": current_step,
            "total_steps": total_steps,
            "step_name": step_name,
        });
        match inner.client.post(&inner.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => debug!(status = %response.status(), "progress report rejected"),
            Err(e) => debug!(error = %e, "progress report failed"),
        }
    }
}
