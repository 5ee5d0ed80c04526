// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! I/O channels between a detached executor and the outside world.
//!
//! Executors never own a terminal: every byte of step output and every
//! line of interactive input flows through a channel. Production uses
//! [`HttpChannel`] (buffered POSTs to the daemon plus polled GETs);
//! [`PipeChannel`] serves in-process tests over a socketpair and
//! [`NullChannel`] serves non-interactive runs.

mod http;
mod null;
mod pipe;

pub use http::HttpChannel;
pub use null::NullChannel;
pub use pipe::PipeChannel;

use async_trait::async_trait;
use thiserror::Error;

/// Default write-buffer threshold before an automatic flush (8 KiB).
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 8 * 1024;

/// Default cap for a single buffered input line (64 KiB).
pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

/// Channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No data available right now; try again later.
    #[error("would block")]
    WouldBlock,

    /// The peer closed the stream; no more data will arrive.
    #[error("end of stream")]
    Eof,

    /// A line exceeded the caller's maximum length.
    #[error("line exceeds {0} bytes")]
    BufferOverflow(usize),

    /// The transport failed; buffered output is retained for retry.
    #[error("network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation on a closed channel.
    #[error("channel closed")]
    Closed,
}

/// A byte-and-line oriented duplex channel.
///
/// Writes buffer until the configured threshold, then flush; `flush`
/// drains the buffer, preserving the tail on partial transport failure.
/// Reads are polled: `WouldBlock` means "nothing yet", `Eof` means the
/// peer is gone for good.
#[async_trait]
pub trait IoChannel: Send {
    /// Buffer `data` for the peer, flushing when the buffer fills.
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError>;

    /// Convenience for string payloads.
    async fn write_str(&mut self, s: &str) -> Result<(), ChannelError> {
        self.write(s.as_bytes()).await
    }

    /// Drain the write buffer to the transport.
    async fn flush(&mut self) -> Result<(), ChannelError>;

    /// Read one newline-stripped line of at most `max` bytes.
    async fn read_line(&mut self, max: usize) -> Result<String, ChannelError>;

    /// Read exactly `len` bytes.
    async fn read(&mut self, len: usize) -> Result<Vec<u8>, ChannelError>;

    /// Non-destructive readiness test for buffered input.
    fn has_data(&self) -> bool;

    /// Flush, then release the transport. Idempotent.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
