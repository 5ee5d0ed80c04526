// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle scenarios: completion, failure, timeout, abandon, pause.

use super::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn clean_exit_finalizes_as_completed() {
    let td = boot_with_stub("exit 0").await;
    let script = write_template(td.root.path(), "fix_bug.json");

    let started = td.start(serde_json::json!({ "script": script })).await;
    let id = started["workflow_id"].as_str().unwrap().to_string();

    let status = td
        .wait_for_state(&id, "completed", Duration::from_secs(5))
        .await;
    assert_eq!(status["exit_code"], 0);
    assert!(status["end_time"].as_u64().unwrap() > 0);

    td.daemon.stop().await;
}

#[tokio::test]
async fn nonzero_exit_finalizes_as_failed() {
    let td = boot_with_stub("exit 3").await;
    let script = write_template(td.root.path(), "t.json");

    let started = td.start(serde_json::json!({ "script": script })).await;
    let id = started["workflow_id"].as_str().unwrap().to_string();

    let status = td.wait_for_state(&id, "failed", Duration::from_secs(5)).await;
    assert_eq!(status["exit_code"], 3);

    td.daemon.stop().await;
}

#[tokio::test]
async fn timeout_kills_and_records_124_within_grace() {
    // The stub traps SIGTERM-free: plain sleep dies on SIGTERM, which is
    // enough — the supervisor pins the 124 sentinel either way.
    let td = boot_with_stub("sleep 60").await;
    let script = write_template(td.root.path(), "t.json");

    let started = td
        .start(serde_json::json!({ "script": script, "timeout_seconds": 1 }))
        .await;
    let id = started["workflow_id"].as_str().unwrap().to_string();

    // timeout (1s) + grace (≤2s) + scheduling slack.
    let began = std::time::Instant::now();
    let status = td.wait_for_state(&id, "failed", Duration::from_secs(8)).await;
    assert_eq!(status["exit_code"], 124);
    assert!(began.elapsed() < Duration::from_secs(8));

    td.daemon.stop().await;
}

#[tokio::test]
async fn abandon_terminates_and_finalizes_as_abandoned() {
    let td = boot_with_stub("while :; do sleep 1; done").await;
    let script = write_template(td.root.path(), "t.json");

    let started = td.start(serde_json::json!({ "script": script })).await;
    let id = started["workflow_id"].as_str().unwrap().to_string();
    td.wait_for_state(&id, "running", Duration::from_secs(5)).await;

    let response = td
        .client
        .delete(format!("{}/api/workflow/abandon/{id}", td.base))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["action"], "abandoned");

    td.wait_for_state(&id, "abandoned", Duration::from_secs(5)).await;

    td.daemon.stop().await;
}

#[tokio::test]
async fn pause_resume_state_machine_over_http() {
    // The stub ignores the pause/resume signals themselves (a real
    // executor flips flags); only the daemon-side state machine is under
    // test here.
    let td = boot_with_stub("trap '' USR1 USR2\nwhile :; do sleep 1; done").await;
    let script = write_template(td.root.path(), "t.json");

    let started = td.start(serde_json::json!({ "script": script })).await;
    let id = started["workflow_id"].as_str().unwrap().to_string();
    td.wait_for_state(&id, "running", Duration::from_secs(5)).await;
    // Give the stub a moment to install its trap before signalling.
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Resume before pause: wrong state.
    let response = td
        .post(&format!("/api/workflow/resume/{id}"), serde_json::json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let response = td
        .post(&format!("/api/workflow/pause/{id}"), serde_json::json!({}))
        .await;
    assert!(response.status().is_success());
    assert_eq!(td.status(&id).await["state"], "paused");

    // Pause again: wrong state.
    let response = td
        .post(&format!("/api/workflow/pause/{id}"), serde_json::json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let response = td
        .post(&format!("/api/workflow/resume/{id}"), serde_json::json!({}))
        .await;
    assert!(response.status().is_success());
    assert_eq!(td.status(&id).await["state"], "running");

    td.daemon.stop().await;
}

#[tokio::test]
async fn terminal_state_survives_daemon_restart() {
    let td = boot_with_stub("exit 0").await;
    let script = write_template(td.root.path(), "t.json");

    let started = td.start(serde_json::json!({ "script": script })).await;
    let id = started["workflow_id"].as_str().unwrap().to_string();
    td.wait_for_state(&id, "completed", Duration::from_secs(5)).await;

    // Stop persists; a fresh daemon over the same root sees the entry.
    let root = td.root;
    td.daemon.stop().await;

    let registry = std::fs::read_to_string(root.path().join("registry.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&registry).unwrap();
    let entry = doc["workflows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["id"] == id.as_str())
        .unwrap();
    assert_eq!(entry["status"], "completed");
    assert!(entry["end_time"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn health_reports_workflow_count() {
    let td = boot_with_stub("sleep 2").await;
    let script = write_template(td.root.path(), "t.json");
    td.start(serde_json::json!({ "script": script })).await;

    let health: serde_json::Value = td.get("/api/health").await.json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["workflows"], 1);

    let version: serde_json::Value = td.get("/api/version").await.json().await.unwrap();
    assert_eq!(version["name"], "argod");

    td.daemon.stop().await;
}
