// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health and version handlers.

use super::ApiContext;
use crate::protocol::{HealthResponse, VersionResponse};
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// `GET /api/health`
pub async fn health(State(ctx): State<Arc<ApiContext>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        workflows: ctx.registry.count(None),
    })
}

/// `GET /api/version`
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: "argod".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
