// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI query handler: the daemon-side provider callback.

use super::{ApiContext, ApiError};
use crate::protocol::{CiQueryBody, CiQueryResponse};
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::{debug, warn};

/// `POST /api/ci/query`
pub async fn query(
    State(ctx): State<Arc<ApiContext>>,
    Json(body): Json<CiQueryBody>,
) -> Result<Json<CiQueryResponse>, ApiError> {
    if body.query.is_empty() {
        return Err(ApiError::bad_request("missing query"));
    }

    let provider = ctx.providers.get(body.provider.as_deref())?;
    debug!(provider = provider.name(), "running ci query");

    let response = provider
        .query(&body.query, body.model.as_deref())
        .await
        .map_err(|e| {
            warn!(provider = provider.name(), error = %e, "ci query failed");
            ApiError::from(e)
        })?;

    Ok(Json(CiQueryResponse {
        status: "success".to_string(),
        provider: provider.name().to_string(),
        response,
    }))
}
