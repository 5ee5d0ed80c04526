// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authoritative in-memory workflow catalog with JSON persistence.
//!
//! One mutex guards the whole structure; it is held only for map
//! lookups/mutations and the save critical section, never across a spawn
//! or a blocking HTTP call. Saves are coalesced behind a dirty flag:
//! mutations call `schedule_save` and the daemon's flush task writes the
//! file out of band.

use argo_core::{WorkflowEntry, WorkflowState};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("workflow already exists: {0}")]
    Duplicate(String),

    #[error("workflow not found: {0}")]
    NotFound(String),

    #[error("invalid state transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: WorkflowState,
        to: WorkflowState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk registry document
#[derive(Debug, Serialize, Deserialize)]
struct RegistryDoc {
    workflows: Vec<WorkflowEntry>,
    last_updated: u64,
}

struct RegistryInner {
    /// Insertion-ordered so `list()` reflects start order.
    entries: IndexMap<String, WorkflowEntry>,
    dirty: bool,
    last_modified: u64,
}

/// The workflow registry.
pub struct WorkflowRegistry {
    inner: Mutex<RegistryInner>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                entries: IndexMap::new(),
                dirty: false,
                last_modified: 0,
            }),
        }
    }

    /// Load a registry from disk. A missing file yields an empty registry;
    /// malformed entries are dropped with a warning (the rest survive).
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let registry = Self::new();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(registry),
            Err(e) => return Err(e.into()),
        };

        let doc: serde_json::Value = match serde_json::from_str(&data) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "registry file unreadable, starting empty");
                return Ok(registry);
            }
        };

        let workflows = doc
            .get("workflows")
            .and_then(|w| w.as_array())
            .cloned()
            .unwrap_or_default();

        let mut inner = registry.inner.lock();
        for value in workflows {
            match serde_json::from_value::<WorkflowEntry>(value.clone()) {
                Ok(entry) if entry.id.is_empty() || entry.template_name.is_empty() => {
                    warn!("dropping registry entry with empty id or template");
                }
                Ok(entry) => {
                    if inner.entries.insert(entry.id.clone(), entry).is_some() {
                        warn!("dropping duplicate registry entry");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "dropping malformed registry entry");
                }
            }
        }
        let count = inner.entries.len();
        drop(inner);
        debug!(path = %path.display(), count, "registry loaded");
        Ok(registry)
    }

    /// Add a new entry. Duplicate ids are rejected with the registry
    /// unchanged.
    pub fn add(&self, entry: WorkflowEntry) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(entry.id.as_str()) {
            return Err(RegistryError::Duplicate(entry.id));
        }
        let now = entry.last_active;
        inner.entries.insert(entry.id.clone(), entry);
        mark_dirty(&mut inner, now);
        Ok(())
    }

    /// Read-only snapshot of one entry.
    pub fn find(&self, id: &str) -> Option<WorkflowEntry> {
        self.inner.lock().entries.get(id).cloned()
    }

    /// Locate the live entry owning an executor pid.
    pub fn find_by_pid(&self, pid: u32) -> Option<WorkflowEntry> {
        self.inner
            .lock()
            .entries
            .values()
            .find(|e| e.executor_pid == pid && !e.is_terminal())
            .cloned()
    }

    /// Transition an entry to a new state. Terminal targets stamp
    /// `end_time` if unset; transitions out of a terminal state are
    /// rejected, as are any the state machine forbids.
    pub fn update_state(
        &self,
        id: &str,
        state: WorkflowState,
        now: u64,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if !entry.state.can_transition(state) {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                from: entry.state,
                to: state,
            });
        }
        entry.state = state;
        entry.last_active = now;
        if state.is_terminal() && entry.end_time == 0 {
            entry.end_time = now;
        }
        mark_dirty(&mut inner, now);
        Ok(())
    }

    /// Transition to a terminal state recording the exit code.
    pub fn finalize(
        &self,
        id: &str,
        state: WorkflowState,
        exit_code: i32,
        now: u64,
    ) -> Result<(), RegistryError> {
        {
            let mut inner = self.inner.lock();
            let entry = inner
                .entries
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            if !entry.state.can_transition(state) {
                return Err(RegistryError::InvalidTransition {
                    id: id.to_string(),
                    from: entry.state,
                    to: state,
                });
            }
            entry.state = state;
            entry.exit_code = exit_code;
            entry.last_active = now;
            if entry.end_time == 0 {
                entry.end_time = now;
            }
            mark_dirty(&mut inner, now);
        }
        debug!(workflow_id = id, state = %state, exit_code, "workflow finalized");
        Ok(())
    }

    /// Record step progress. Idempotent and monotonic per entry.
    pub fn update_progress(
        &self,
        id: &str,
        current_step: u32,
        total_steps: u32,
        step_name: &str,
        now: u64,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        entry.record_progress(current_step, total_steps, step_name, now);
        mark_dirty(&mut inner, now);
        Ok(())
    }

    /// Apply an arbitrary mutation to one entry under the registry lock.
    pub fn update<F>(&self, id: &str, mutate: F) -> Result<WorkflowEntry, RegistryError>
    where
        F: FnOnce(&mut WorkflowEntry),
    {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        mutate(entry);
        let snapshot = entry.clone();
        let now = snapshot.last_active;
        mark_dirty(&mut inner, now);
        Ok(snapshot)
    }

    /// Remove an entry. A save is scheduled.
    pub fn remove(&self, id: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if inner.entries.shift_remove(id).is_none() {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        let now = inner.last_modified;
        mark_dirty(&mut inner, now);
        Ok(())
    }

    /// Snapshot of all entries in insertion order.
    pub fn list(&self) -> Vec<WorkflowEntry> {
        self.inner.lock().entries.values().cloned().collect()
    }

    /// Count entries, optionally filtered by state.
    pub fn count(&self, filter: Option<WorkflowState>) -> usize {
        let inner = self.inner.lock();
        match filter {
            Some(state) => inner.entries.values().filter(|e| e.state == state).count(),
            None => inner.entries.len(),
        }
    }

    /// Remove terminal entries that ended before `older_than`. Returns the
    /// removed ids so callers can clean up logs and mailboxes.
    pub fn prune(&self, older_than: u64) -> Vec<String> {
        let mut inner = self.inner.lock();
        let doomed: Vec<String> = inner
            .entries
            .values()
            .filter(|e| e.is_terminal() && e.end_time < older_than)
            .map(|e| e.id.clone())
            .collect();
        for id in &doomed {
            inner.entries.shift_remove(id);
        }
        if !doomed.is_empty() {
            let now = inner.last_modified;
            mark_dirty(&mut inner, now);
        }
        doomed
    }

    /// Mark the registry as needing a save.
    pub fn schedule_save(&self, now: u64) {
        let mut inner = self.inner.lock();
        mark_dirty(&mut inner, now);
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    /// Write the registry to disk unconditionally (tmp + atomic rename).
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let (doc, count) = {
            let mut inner = self.inner.lock();
            inner.dirty = false;
            (
                RegistryDoc {
                    workflows: inner.entries.values().cloned().collect(),
                    last_updated: inner.last_modified,
                },
                inner.entries.len(),
            )
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&doc)?)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), count, "registry saved");
        Ok(())
    }

    /// Write the registry out only if a save is pending.
    pub fn flush_if_dirty(&self, path: &Path) -> Result<(), RegistryError> {
        if self.is_dirty() {
            self.save(path)?;
        }
        Ok(())
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn mark_dirty(inner: &mut RegistryInner, now: u64) {
    inner.dirty = true;
    if now > inner.last_modified {
        inner.last_modified = now;
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
