// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output/input mediation handlers.
//!
//! Executors POST output and poll GET input; clients do the reverse.
//! Output acceptance is deliberately lenient (a finishing executor may
//! outlive its registry entry); input endpoints validate the workflow so
//! typos surface as 404 instead of silently queueing.

use super::{ApiContext, ApiError};
use crate::mailbox::MailboxError;
use crate::protocol::{AckResponse, InputBody, InputResponse, OutputBody, OutputResponse};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct WorkflowNameQuery {
    pub workflow_name: String,
}

/// `POST /api/workflow/output?workflow_name={id}` (executor → daemon)
pub async fn post_output(
    State(ctx): State<Arc<ApiContext>>,
    Query(query): Query<WorkflowNameQuery>,
    Json(body): Json<OutputBody>,
) -> Json<AckResponse> {
    debug!(
        workflow_id = %query.workflow_name,
        bytes = body.output.len(),
        "output received"
    );
    ctx.mailbox.append_output(&query.workflow_name, &body.output);
    Json(AckResponse::success())
}

/// `GET /api/workflow/output?workflow_name={id}` (client drain)
pub async fn get_output(
    State(ctx): State<Arc<ApiContext>>,
    Query(query): Query<WorkflowNameQuery>,
) -> Result<Json<OutputResponse>, ApiError> {
    let id = query.workflow_name;
    if ctx.registry.find(&id).is_none() {
        return Err(ApiError::not_found(format!("workflow not found: {id}")));
    }
    let output = ctx.mailbox.take_output(&id);
    Ok(Json(OutputResponse {
        workflow_id: id,
        output,
    }))
}

/// `POST /api/workflow/input?workflow_name={id}` (client → daemon)
pub async fn post_input(
    State(ctx): State<Arc<ApiContext>>,
    Query(query): Query<WorkflowNameQuery>,
    Json(body): Json<InputBody>,
) -> Result<Json<AckResponse>, ApiError> {
    let id = query.workflow_name;
    if ctx.registry.find(&id).is_none() {
        return Err(ApiError::not_found(format!("workflow not found: {id}")));
    }
    match ctx.mailbox.push_input(&id, body.input) {
        Ok(()) => Ok(Json(AckResponse::success())),
        Err(MailboxError::Full) => Err(ApiError::conflict("input queue full")),
    }
}

/// `GET /api/workflow/input?workflow_name={id}` (executor poll)
///
/// 200 with one line, 204 when nothing is queued yet.
pub async fn get_input(
    State(ctx): State<Arc<ApiContext>>,
    Query(query): Query<WorkflowNameQuery>,
) -> Result<Response, ApiError> {
    let id = query.workflow_name;
    if ctx.registry.find(&id).is_none() {
        return Err(ApiError::not_found(format!("workflow not found: {id}")));
    }
    match ctx.mailbox.pop_input(&id) {
        Some(input) => Ok(Json(InputResponse {
            workflow_id: id,
            input,
        })
        .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
