// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP channel: output flushed via POST, input polled via GET.

use super::{ChannelError, IoChannel, DEFAULT_WRITE_BUFFER_SIZE};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout for both output flushes and input polls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct InputBody {
    input: String,
}

/// Channel speaking HTTP to the daemon.
///
/// One `reqwest::Client` per channel: flushes are awaited sequentially on
/// a single connection, which is what preserves program-order delivery of
/// output. Input arrives line-at-a-time from the daemon's per-workflow
/// queue; fetched lines buffer locally so `read`/`read_line` and
/// `has_data` compose.
pub struct HttpChannel {
    client: reqwest::Client,
    daemon_url: String,
    workflow_id: String,
    write_buffer: String,
    write_buffer_size: usize,
    read_buffer: VecDeque<u8>,
    open: bool,
}

impl HttpChannel {
    pub fn new(daemon_url: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            // Falls back to default settings only if the builder rejects
            // the timeout configuration, which it does not for constants.
            .unwrap_or_default();
        Self {
            client,
            daemon_url: daemon_url.into().trim_end_matches('/').to_string(),
            workflow_id: workflow_id.into(),
            write_buffer: String::new(),
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            read_buffer: VecDeque::new(),
            open: true,
        }
    }

    /// Override the auto-flush threshold (tests use small values).
    pub fn with_write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size.max(1);
        self
    }

    fn output_url(&self) -> String {
        format!(
            "{}/api/workflow/output?workflow_name={}",
            self.daemon_url, self.workflow_id
        )
    }

    fn input_url(&self) -> String {
        format!(
            "{}/api/workflow/input?workflow_name={}",
            self.daemon_url, self.workflow_id
        )
    }

    /// Poll the daemon once for a line of input; buffer it locally.
    async fn poll_input(&mut self) -> Result<(), ChannelError> {
        let response = self
            .client
            .get(self.input_url())
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let body: InputBody = response
                    .json()
                    .await
                    .map_err(|e| ChannelError::Network(e.to_string()))?;
                self.read_buffer.extend(body.input.as_bytes());
                self.read_buffer.push_back(b'\n');
                Ok(())
            }
            // 204/404 both mean "no data yet".
            204 | 404 => Err(ChannelError::WouldBlock),
            status => Err(ChannelError::Network(format!(
                "input poll returned {status}"
            ))),
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
        self.read_buffer.pop_front(); // the newline itself
        Some(Ok(String::from_utf8_lossy(&line).into_owned()))
    }
}

#[async_trait]
impl IoChannel for HttpChannel {
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        self.write_buffer
            .push_str(&String::from_utf8_lossy(data));
        if self.write_buffer.len() >= self.write_buffer_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ChannelError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }
        if !self.open {
            return Err(ChannelError::Closed);
        }

        let body = serde_json::json!({ "output": self.write_buffer });
        let result = self
            .client
            .post(self.output_url())
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(
                    workflow_id = %self.workflow_id,
                    bytes = self.write_buffer.len(),
                    "output flushed"
                );
                self.write_buffer.clear();
                Ok(())
            }
            Ok(response) => Err(ChannelError::Network(format!(
                "output post returned {}",
                response.status()
            ))),
            // Buffer retained; the next flush retries.
            Err(e) => Err(ChannelError::Network(e.to_string())),
        }
    }

    async fn read_line(&mut self, max: usize) -> Result<String, ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        if let Some(line) = self.take_buffered_line(max) {
            return line;
        }
        self.poll_input().await?;
        self.take_buffered_line(max)
            .unwrap_or(Err(ChannelError::WouldBlock))
    }

    async fn read(&mut self, len: usize) -> Result<Vec<u8>, ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        if self.read_buffer.len() < len {
            self.poll_input().await?;
        }
        if self.read_buffer.len() < len {
            return Err(ChannelError::WouldBlock);
        }
        Ok(self.read_buffer.drain(..len).collect())
    }

    /// Reports buffered input only: probing the daemon would dequeue.
    fn has_data(&self) -> bool {
        !self.read_buffer.is_empty()
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if !self.open {
            return Ok(());
        }
        let flush_result = self.flush().await;
        self.open = false;
        flush_result
    }
}
