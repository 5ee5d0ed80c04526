// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! argo-engine: executor lifecycle management.
//!
//! The engine owns everything between "start request accepted" and
//! "registry entry finalized": script/env validation, spawning the
//! `argo-exec` child with a sanitized environment, reaping exits through
//! the exit-code queue, and the supervisor loop (timeouts, retry with
//! backoff, pause/resume/abandon signalling, reconciliation).

pub mod error;
pub mod lifecycle;
pub mod reaper;
pub mod spawn;
pub mod validate;

pub use error::EngineError;
pub use lifecycle::{ExecutorLifecycle, LifecycleConfig, StartRequest};
pub use reaper::{spawn_reaper, ReaperHandle};
pub use spawn::{ExecutorSpawner, SpawnConfig, SpawnSpec, Spawner};
pub use validate::{validate_env, validate_script_path};

#[cfg(any(test, feature = "test-support"))]
pub use spawn::FakeSpawner;
