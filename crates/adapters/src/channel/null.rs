// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Null channel: discards writes, EOF on reads.

use super::{ChannelError, IoChannel};
use async_trait::async_trait;

/// Channel for non-interactive runs. Output is dropped; input is always
/// at end-of-stream.
#[derive(Debug, Default)]
pub struct NullChannel {
    open: bool,
    /// Total bytes discarded (visible for tests and diagnostics).
    pub discarded: u64,
}

impl NullChannel {
    pub fn new() -> Self {
        Self {
            open: true,
            discarded: 0,
        }
    }
}

#[async_trait]
impl IoChannel for NullChannel {
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        self.discarded += data.len() as u64;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn read_line(&mut self, _max: usize) -> Result<String, ChannelError> {
        Err(ChannelError::Eof)
    }

    async fn read(&mut self, _len: usize) -> Result<Vec<u8>, ChannelError> {
        Err(ChannelError::Eof)
    }

    fn has_data(&self) -> bool {
        false
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.open = false;
        Ok(())
    }
}
