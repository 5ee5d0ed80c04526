// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP API: routing and the shared handler context.
//!
//! Handlers receive the daemon as state; nothing here is process-global.
//! Only this edge translates typed errors into HTTP status codes.

mod ci;
mod io;
mod meta;
mod workflows;

use crate::mailbox::Mailbox;
use argo_adapters::{ProviderError, ProviderRegistry, UnixProcessAdapter};
use argo_core::Clock;
use argo_engine::{EngineError, ExecutorLifecycle, ExecutorSpawner};
use argo_storage::{RegistryError, WorkflowRegistry};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// Concrete lifecycle type the daemon runs.
pub type DaemonLifecycle = ExecutorLifecycle<UnixProcessAdapter, ExecutorSpawner>;

/// Shared daemon context for all request handlers.
pub struct ApiContext {
    pub lifecycle: Arc<DaemonLifecycle>,
    pub registry: Arc<WorkflowRegistry>,
    pub mailbox: Mailbox,
    pub providers: ProviderRegistry,
    pub clock: Arc<dyn Clock>,
}

/// Build the API router.
pub fn router(ctx: Arc<ApiContext>) -> Router {
    Router::new()
        .route("/api/workflow/start", post(workflows::start))
        .route("/api/workflow/list", get(workflows::list))
        .route("/api/workflow/status/:id", get(workflows::status))
        .route("/api/workflow/progress/:id", post(workflows::progress))
        .route("/api/workflow/pause/:id", post(workflows::pause))
        .route("/api/workflow/resume/:id", post(workflows::resume))
        .route("/api/workflow/abandon/:id", delete(workflows::abandon))
        .route(
            "/api/workflow/output",
            post(io::post_output).get(io::get_output),
        )
        .route(
            "/api/workflow/input",
            post(io::post_input).get(io::get_input),
        )
        .route("/api/ci/query", post(ci::query))
        .route("/api/health", get(meta::health))
        .route("/api/version", get(meta::version))
        .with_state(ctx)
}

/// API-edge error: a status code plus a JSON error body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = crate::protocol::ErrorResponse {
            status: "error".to_string(),
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::InvalidPath(_)
            | EngineError::DeniedEnv(_)
            | EngineError::InvalidEnv(_) => StatusCode::BAD_REQUEST,
            EngineError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            EngineError::Registry(RegistryError::Duplicate(_))
            | EngineError::Registry(RegistryError::InvalidTransition { .. })
            | EngineError::WrongState { .. } => StatusCode::CONFLICT,
            EngineError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Spawn(_)
            | EngineError::Process(_)
            | EngineError::Io(_)
            | EngineError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        Self::from(EngineError::Registry(e))
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        let status = match &e {
            ProviderError::Unknown(_) => StatusCode::BAD_REQUEST,
            ProviderError::Unavailable { .. } | ProviderError::Timeout { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProviderError::Failed { .. } => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
