// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workflow I/O mailbox.
//!
//! The daemon mediates all executor I/O: clients POST input lines which
//! executors poll (FIFO, bounded), and executors POST output which
//! clients drain when attaching. One mutex guards the whole map; every
//! operation is a short lookup.

use argo_core::limits::INPUT_QUEUE_CAPACITY;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

/// Cap on a buffered output backlog; the front is discarded beyond it.
const MAX_OUTPUT_BACKLOG: usize = 4 * 1024 * 1024;

/// Mailbox errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailboxError {
    #[error("input queue full")]
    Full,
}

#[derive(Default)]
struct WorkflowBox {
    inputs: VecDeque<String>,
    output: String,
}

/// Shared handle to the daemon's mailboxes.
#[derive(Clone, Default)]
pub struct Mailbox {
    inner: Arc<Mutex<HashMap<String, WorkflowBox>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one input line for a workflow. FIFO, bounded.
    pub fn push_input(&self, workflow_id: &str, line: String) -> Result<(), MailboxError> {
        let mut inner = self.inner.lock();
        let slot = inner.entry(workflow_id.to_string()).or_default();
        if slot.inputs.len() >= INPUT_QUEUE_CAPACITY {
            return Err(MailboxError::Full);
        }
        slot.inputs.push_back(line);
        Ok(())
    }

    /// Dequeue the oldest input line, if any.
    pub fn pop_input(&self, workflow_id: &str) -> Option<String> {
        self.inner
            .lock()
            .get_mut(workflow_id)
            .and_then(|slot| slot.inputs.pop_front())
    }

    /// Append executor output to the workflow's backlog.
    pub fn append_output(&self, workflow_id: &str, text: &str) {
        let mut inner = self.inner.lock();
        let slot = inner.entry(workflow_id.to_string()).or_default();
        slot.output.push_str(text);
        if slot.output.len() > MAX_OUTPUT_BACKLOG {
            let excess = slot.output.len() - MAX_OUTPUT_BACKLOG;
            // Trim on a char boundary at or after the excess point.
            let cut = (excess..slot.output.len())
                .find(|&i| slot.output.is_char_boundary(i))
                .unwrap_or(slot.output.len());
            slot.output.drain(..cut);
        }
    }

    /// Drain the buffered output for a workflow.
    pub fn take_output(&self, workflow_id: &str) -> String {
        self.inner
            .lock()
            .get_mut(workflow_id)
            .map(|slot| std::mem::take(&mut slot.output))
            .unwrap_or_default()
    }

    /// Queued input count (diagnostics).
    pub fn input_len(&self, workflow_id: &str) -> usize {
        self.inner
            .lock()
            .get(workflow_id)
            .map(|slot| slot.inputs.len())
            .unwrap_or(0)
    }

    /// Drop a workflow's mailbox entirely (on prune/remove).
    pub fn remove(&self, workflow_id: &str) {
        self.inner.lock().remove(workflow_id);
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
