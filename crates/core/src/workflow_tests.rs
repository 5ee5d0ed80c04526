// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use yare::parameterized;

fn entry(id: &str) -> WorkflowEntry {
    let clock = FakeClock::at_epoch_secs(1_000);
    WorkflowEntry::new(
        WorkflowConfig::new(id, "fix_bug")
            .branch("main")
            .environment("dev")
            .timeout_seconds(3600)
            .max_retries(2),
        &clock,
    )
}

#[test]
fn new_entry_is_pending() {
    let wf = entry("wf_1_2");
    assert_eq!(wf.state, WorkflowState::Pending);
    assert_eq!(wf.executor_pid, 0);
    assert_eq!(wf.start_time, 1_000);
    assert_eq!(wf.end_time, 0);
    assert!(!wf.is_terminal());
}

#[test]
fn environment_is_length_capped() {
    let clock = FakeClock::new();
    let config = WorkflowConfig::new("wf", "t").environment("e".repeat(100));
    let wf = WorkflowEntry::new(config, &clock);
    assert_eq!(wf.environment.len(), crate::limits::MAX_ENVIRONMENT_LEN);
}

#[parameterized(
    pending_to_running = { WorkflowState::Pending, WorkflowState::Running, true },
    pending_to_failed = { WorkflowState::Pending, WorkflowState::Failed, true },
    pending_to_paused = { WorkflowState::Pending, WorkflowState::Paused, false },
    running_to_paused = { WorkflowState::Running, WorkflowState::Paused, true },
    running_to_completed = { WorkflowState::Running, WorkflowState::Completed, true },
    running_retry = { WorkflowState::Running, WorkflowState::Pending, true },
    paused_to_running = { WorkflowState::Paused, WorkflowState::Running, true },
    paused_to_abandoned = { WorkflowState::Paused, WorkflowState::Abandoned, true },
    paused_to_pending = { WorkflowState::Paused, WorkflowState::Pending, false },
    completed_is_final = { WorkflowState::Completed, WorkflowState::Running, false },
    failed_is_final = { WorkflowState::Failed, WorkflowState::Pending, false },
    abandoned_is_final = { WorkflowState::Abandoned, WorkflowState::Running, false },
)]
fn transition_table(from: WorkflowState, to: WorkflowState, allowed: bool) {
    assert_eq!(from.can_transition(to), allowed);
}

#[test]
fn terminal_states() {
    assert!(WorkflowState::Completed.is_terminal());
    assert!(WorkflowState::Failed.is_terminal());
    assert!(WorkflowState::Abandoned.is_terminal());
    assert!(!WorkflowState::Pending.is_terminal());
    assert!(!WorkflowState::Running.is_terminal());
    assert!(!WorkflowState::Paused.is_terminal());
}

#[test]
fn state_display_is_lowercase() {
    assert_eq!(WorkflowState::Running.to_string(), "running");
    assert_eq!(WorkflowState::Abandoned.to_string(), "abandoned");
}

#[test]
fn mark_running_records_pid() {
    let mut wf = entry("wf_1_2");
    wf.mark_running(4242, 1_005);
    assert_eq!(wf.state, WorkflowState::Running);
    assert_eq!(wf.executor_pid, 4242);
    assert_eq!(wf.last_active, 1_005);
}

#[test]
fn mark_retrying_increments_and_clears_pid() {
    let mut wf = entry("wf_1_2");
    wf.mark_running(4242, 1_005);
    wf.mark_retrying(1_010);
    assert_eq!(wf.state, WorkflowState::Pending);
    assert_eq!(wf.executor_pid, 0);
    assert_eq!(wf.retry_count, 1);
    assert_eq!(wf.last_retry_time, 1_010);
}

#[test]
fn retries_left_respects_max_and_abandon() {
    let mut wf = entry("wf_1_2");
    assert!(wf.retries_left());
    wf.retry_count = 2;
    assert!(!wf.retries_left());

    let mut wf = entry("wf_3_4");
    wf.abandon_requested = true;
    assert!(!wf.retries_left());
}

#[test]
fn progress_is_monotonic() {
    let mut wf = entry("wf_1_2");
    wf.record_progress(3, 10, "build", 1_001);
    assert_eq!(wf.current_step, 3);
    assert_eq!(wf.total_steps, 10);
    assert_eq!(wf.last_step_name, "build");

    // A stale report for step 2 is ignored.
    wf.record_progress(2, 10, "old", 1_002);
    assert_eq!(wf.current_step, 3);
    assert_eq!(wf.last_step_name, "build");

    // Repeating the same step is idempotent.
    wf.record_progress(3, 10, "build", 1_003);
    assert_eq!(wf.current_step, 3);
}

#[test]
fn progress_keeps_totals_when_unknown() {
    let mut wf = entry("wf_1_2");
    wf.record_progress(1, 5, "a", 1_001);
    wf.record_progress(2, 0, "b", 1_002);
    assert_eq!(wf.total_steps, 5);
}

#[test]
fn serde_uses_registry_field_names() {
    let wf = entry("wf_1_2");
    let json = serde_json::to_value(&wf).unwrap();
    assert_eq!(json["id"], "wf_1_2");
    assert_eq!(json["template"], "fix_bug");
    assert_eq!(json["branch"], "main");
    assert_eq!(json["status"], "pending");
    assert_eq!(json["created_at"], 1_000);
    assert_eq!(json["pid"], 0);
    // Transient supervisor flag never hits disk.
    assert!(json.get("timeout_fired").is_none());
}

#[test]
fn serde_tolerates_unknown_and_missing_fields() {
    let json = r#"{"id":"wf_5_6","template":"t","status":"completed","mystery":42}"#;
    let wf: WorkflowEntry = serde_json::from_str(json).unwrap();
    assert_eq!(wf.id, "wf_5_6");
    assert_eq!(wf.state, WorkflowState::Completed);
    assert_eq!(wf.executor_pid, 0);
    assert_eq!(wf.active_branch, "");
}
