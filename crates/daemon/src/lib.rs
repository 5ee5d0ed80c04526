// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! argo-daemon: the HTTP control plane and supervisor (argod).
//!
//! Architecture:
//! - HTTP listener (axum): request handlers mutate the registry and
//!   drive the executor lifecycle through a shared [`http::ApiContext`].
//! - Supervisor task: ticks the engine (exit processing, timeouts,
//!   retries, reconciliation).
//! - Flush task: coalesced registry persistence behind its dirty flag.
//! - Prune task: drops aged-out terminal entries with their logs,
//!   checkpoints, and mailboxes.

pub mod env;
pub mod http;
pub mod lifecycle;
pub mod mailbox;
pub mod protocol;

pub use http::{router, ApiContext};
pub use lifecycle::{spawn_daemon, Config, DaemonHandle, LifecycleError};
pub use mailbox::Mailbox;
