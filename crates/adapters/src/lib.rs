// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! argo-adapters: I/O channels, CI providers, and process signalling

pub mod channel;
pub mod ci_client;
pub mod process;
pub mod provider;

pub use channel::{ChannelError, HttpChannel, IoChannel, NullChannel, PipeChannel};
pub use ci_client::CiClient;
pub use process::{ProcessAdapter, ProcessError, ProcessSignal, UnixProcessAdapter};
pub use provider::{CiProvider, CommandProvider, EchoProvider, ProviderError, ProviderRegistry};

#[cfg(any(test, feature = "test-support"))]
pub use process::FakeProcessAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use provider::FakeProvider;
