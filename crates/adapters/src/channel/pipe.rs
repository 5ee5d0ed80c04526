// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socketpair channel for in-process use and tests.

use super::{ChannelError, IoChannel, DEFAULT_WRITE_BUFFER_SIZE};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

/// Channel over one end of a Unix socketpair.
///
/// Reads are non-blocking (`try_read`), so the polling contract matches
/// [`super::HttpChannel`]: `WouldBlock` until data arrives, `Eof` once the
/// peer hangs up and the buffer drains.
pub struct PipeChannel {
    stream: Option<UnixStream>,
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    write_buffer_size: usize,
    peer_closed: bool,
}

impl PipeChannel {
    /// Create a connected channel pair.
    pub fn pair() -> std::io::Result<(Self, Self)> {
        let (a, b) = UnixStream::pair()?;
        Ok((Self::from_stream(a), Self::from_stream(b)))
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self {
            stream: Some(stream),
            read_buffer: VecDeque::new(),
            write_buffer: Vec::new(),
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            peer_closed: false,
        }
    }

    pub fn with_write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size.max(1);
        self
    }

    /// Pull whatever the socket has ready into the read buffer.
    fn fill_read_buffer(&mut self) -> Result<(), ChannelError> {
        let Some(stream) = &self.stream else {
            return Err(ChannelError::Closed);
        };
        let mut chunk = [0u8; 4096];
        loop {
            match stream.try_read(&mut chunk) {
                Ok(0) => {
                    self.peer_closed = true;
                    return Ok(());
                }
                Ok(n) => self.read_buffer.extend(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn take_buffered_line(&mut self, max: usize) -> Option<Result<String, ChannelError>> {
        let newline_at = self.read_buffer.iter().position(|&b| b == b'\n')?;
        if newline_at > max {
            return Some(Err(ChannelError::BufferOverflow(max)));
        }
        let mut line = Vec::with_capacity(newline_at);
        for _ in 0..newline_at {
            if let Some(b) = self.read_buffer.pop_front() {
                line.push(b);
            }
        }
        self.read_buffer.pop_front();
        Some(Ok(String::from_utf8_lossy(&line).into_owned()))
    }

    fn no_more_data(&self) -> Result<(), ChannelError> {
        if self.peer_closed {
            Err(ChannelError::Eof)
        } else {
            Err(ChannelError::WouldBlock)
        }
    }
}

#[async_trait]
impl IoChannel for PipeChannel {
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if self.stream.is_none() {
            return Err(ChannelError::Closed);
        }
        self.write_buffer.extend_from_slice(data);
        if self.write_buffer.len() >= self.write_buffer_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ChannelError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }
        let Some(stream) = &mut self.stream else {
            return Err(ChannelError::Closed);
        };
        stream.write_all(&self.write_buffer).await?;
        self.write_buffer.clear();
        Ok(())
    }

    async fn read_line(&mut self, max: usize) -> Result<String, ChannelError> {
        if let Some(line) = self.take_buffered_line(max) {
            return line;
        }
        self.fill_read_buffer()?;
        match self.take_buffered_line(max) {
            Some(line) => line,
            None if self.peer_closed && !self.read_buffer.is_empty() => {
                // Final unterminated line before EOF.
                let line: Vec<u8> = self.read_buffer.drain(..).collect();
                if line.len() > max {
                    return Err(ChannelError::BufferOverflow(max));
                }
                Ok(String::from_utf8_lossy(&line).into_owned())
            }
            None => self.no_more_data().map(|_| String::new()),
        }
    }

    async fn read(&mut self, len: usize) -> Result<Vec<u8>, ChannelError> {
        if self.read_buffer.len() < len {
            self.fill_read_buffer()?;
        }
        if self.read_buffer.len() < len {
            return self.no_more_data().map(|_| Vec::new());
        }
        Ok(self.read_buffer.drain(..len).collect())
    }

    fn has_data(&self) -> bool {
        !self.read_buffer.is_empty()
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.stream.is_none() {
            return Ok(());
        }
        let flush_result = self.flush().await;
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        flush_result
    }
}
