// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow control handlers.

use super::{ApiContext, ApiError};
use crate::protocol::{
    AbandonResponse, AckResponse, ListResponse, ProgressBody, StartBody, StartResponse,
    StatusResponse, WorkflowSummary,
};
use argo_engine::StartRequest;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::info;

/// `POST /api/workflow/start`
pub async fn start(
    State(ctx): State<Arc<ApiContext>>,
    Json(body): Json<StartBody>,
) -> Result<Json<StartResponse>, ApiError> {
    if body.script.is_empty() {
        return Err(ApiError::bad_request("missing script"));
    }

    let entry = ctx
        .lifecycle
        .start(StartRequest {
            script: body.script,
            args: body.args,
            env: body.env,
            instance: body.instance,
            branch: body.branch,
            environment: body.environment,
            timeout_seconds: body.timeout_seconds,
            max_retries: body.max_retries,
        })
        .await?;

    info!(workflow_id = %entry.id, pid = entry.executor_pid, "workflow started");
    Ok(Json(StartResponse {
        status: "success".to_string(),
        workflow_id: entry.id,
    }))
}

/// `GET /api/workflow/list`
pub async fn list(State(ctx): State<Arc<ApiContext>>) -> Json<ListResponse> {
    let workflows = ctx
        .registry
        .list()
        .iter()
        .map(WorkflowSummary::from)
        .collect();
    Json(ListResponse { workflows })
}

/// `GET /api/workflow/status/{id}`
pub async fn status(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let entry = ctx
        .registry
        .find(&id)
        .ok_or_else(|| ApiError::not_found(format!("workflow not found: {id}")))?;
    Ok(Json(StatusResponse::from(&entry)))
}

/// `POST /api/workflow/progress/{id}`
pub async fn progress(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
    Json(body): Json<ProgressBody>,
) -> Result<Json<AckResponse>, ApiError> {
    let now = ctx.clock.epoch_secs();
    ctx.registry
        .update_progress(&id, body.current_step, body.total_steps, &body.step_name, now)?;
    Ok(Json(AckResponse::success()))
}

/// `POST /api/workflow/pause/{id}`
pub async fn pause(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>, ApiError> {
    ctx.lifecycle.pause(&id)?;
    Ok(Json(AckResponse::success()))
}

/// `POST /api/workflow/resume/{id}`
pub async fn resume(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>, ApiError> {
    ctx.lifecycle.resume(&id)?;
    Ok(Json(AckResponse::success()))
}

/// `DELETE /api/workflow/abandon/{id}`
pub async fn abandon(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<String>,
) -> Result<Json<AbandonResponse>, ApiError> {
    ctx.lifecycle.abandon(&id)?;
    Ok(Json(AbandonResponse {
        status: "success".to_string(),
        action: "abandoned".to_string(),
    }))
}
