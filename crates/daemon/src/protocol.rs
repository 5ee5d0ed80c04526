// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire DTOs for the daemon HTTP API.
//!
//! Shared with the CLI so both sides agree on field names. Unknown
//! fields are tolerated everywhere; additions stay backward compatible.

use argo_core::WorkflowEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `POST /api/workflow/start` request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartBody {
    pub script: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// `{"status":"success","workflow_id":...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub status: String,
    pub workflow_id: String,
}

/// One row of `GET /api/workflow/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub script: String,
    pub state: String,
    pub pid: u32,
}

impl From<&WorkflowEntry> for WorkflowSummary {
    fn from(entry: &WorkflowEntry) -> Self {
        Self {
            workflow_id: entry.id.clone(),
            script: entry.template_name.clone(),
            state: entry.state.to_string(),
            pid: entry.executor_pid,
        }
    }
}

/// `GET /api/workflow/list` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub workflows: Vec<WorkflowSummary>,
}

/// `GET /api/workflow/status/{id}` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub workflow_id: String,
    pub script: String,
    pub state: String,
    pub pid: u32,
    pub start_time: u64,
    pub end_time: u64,
    pub exit_code: i32,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub step_name: String,
}

impl From<&WorkflowEntry> for StatusResponse {
    fn from(entry: &WorkflowEntry) -> Self {
        Self {
            workflow_id: entry.id.clone(),
            script: entry.template_name.clone(),
            state: entry.state.to_string(),
            pid: entry.executor_pid,
            start_time: entry.start_time,
            end_time: entry.end_time,
            exit_code: entry.exit_code,
            current_step: entry.current_step,
            total_steps: entry.total_steps,
            step_name: entry.last_step_name.clone(),
        }
    }
}

/// `POST /api/workflow/progress/{id}` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressBody {
    pub current_step: u32,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub step_name: String,
}

/// Plain `{"status":"success"}` acknowledgements.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// `DELETE /api/workflow/abandon/{id}` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AbandonResponse {
    pub status: String,
    pub action: String,
}

/// `POST /api/workflow/output` request body (from executors).
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputBody {
    pub output: String,
}

/// `GET /api/workflow/output` response (for attach).
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputResponse {
    pub workflow_id: String,
    pub output: String,
}

/// `POST /api/workflow/input` request body (from clients).
#[derive(Debug, Serialize, Deserialize)]
pub struct InputBody {
    pub input: String,
}

/// `GET /api/workflow/input` response (to executors).
#[derive(Debug, Serialize, Deserialize)]
pub struct InputResponse {
    pub workflow_id: String,
    pub input: String,
}

/// `POST /api/ci/query` request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CiQueryBody {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// `POST /api/ci/query` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CiQueryResponse {
    pub status: String,
    pub provider: String,
    pub response: String,
}

/// `GET /api/health` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub workflows: usize,
}

/// `GET /api/version` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}

/// Error payload used by every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}
