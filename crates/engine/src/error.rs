// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine errors

use argo_core::WorkflowState;
use argo_storage::RegistryError;
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid script path: {0}")]
    InvalidPath(String),

    #[error("environment variable not permitted: {0}")]
    DeniedEnv(String),

    #[error("invalid environment variable name: {0}")]
    InvalidEnv(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("workflow {id} is {state}")]
    WrongState { id: String, state: WorkflowState },

    #[error("daemon is shutting down")]
    ShuttingDown,

    #[error("failed to spawn executor: {0}")]
    Spawn(String),

    #[error(transparent)]
    Process(#[from] argo_adapters::ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
