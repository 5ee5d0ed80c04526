// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API-shape scenarios: validation, duplicates, listing, status codes.

use super::prelude::*;

#[tokio::test]
async fn start_returns_wf_id_and_status_shows_running() {
    let td = boot_with_stub("sleep 2").await;
    let script = write_template(td.root.path(), "fix_bug.json");

    let started = td.start(serde_json::json!({ "script": script })).await;
    assert_eq!(started["status"], "success");
    let id = started["workflow_id"].as_str().unwrap();
    assert!(id.starts_with("wf_"));

    let status = td.status(id).await;
    assert_eq!(status["state"], "running");
    assert!(status["pid"].as_u64().unwrap() > 0);
    assert_eq!(status["end_time"], 0);

    td.daemon.stop().await;
}

#[tokio::test]
async fn traversal_and_metacharacter_paths_are_400() {
    let td = boot_with_stub("exit 0").await;

    for script in ["../../../bin/sh", "/tmp/x;rm -rf /", "relative/path.json", ""] {
        let response = td
            .post("/api/workflow/start", serde_json::json!({ "script": script }))
            .await;
        assert_eq!(response.status().as_u16(), 400, "script {script:?}");
    }

    let list: serde_json::Value = td.get("/api/workflow/list").await.json().await.unwrap();
    assert_eq!(list["workflows"].as_array().unwrap().len(), 0);

    td.daemon.stop().await;
}

#[tokio::test]
async fn denylisted_env_is_400() {
    let td = boot_with_stub("exit 0").await;
    let script = write_template(td.root.path(), "t.json");

    let response = td
        .post(
            "/api/workflow/start",
            serde_json::json!({ "script": script, "env": {"LD_PRELOAD": "/evil.so"} }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    td.daemon.stop().await;
}

#[tokio::test]
async fn duplicate_instance_id_is_409() {
    let td = boot_with_stub("sleep 2").await;
    let script = write_template(td.root.path(), "fix_bug.json");

    let first = td
        .start(serde_json::json!({ "script": script, "instance": "run1" }))
        .await;
    assert_eq!(first["workflow_id"], "fix_bug_run1");

    let response = td
        .post(
            "/api/workflow/start",
            serde_json::json!({ "script": script, "instance": "run1" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    td.daemon.stop().await;
}

#[tokio::test]
async fn list_shows_workflows_in_start_order() {
    let td = boot_with_stub("sleep 2").await;
    let script = write_template(td.root.path(), "t.json");

    for instance in ["a", "b", "c"] {
        td.start(serde_json::json!({ "script": script, "instance": instance }))
            .await;
    }

    let list: serde_json::Value = td.get("/api/workflow/list").await.json().await.unwrap();
    let ids: Vec<&str> = list["workflows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["workflow_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["t_a", "t_b", "t_c"]);

    td.daemon.stop().await;
}

#[tokio::test]
async fn unknown_workflow_is_404_everywhere() {
    let td = boot_with_stub("exit 0").await;

    assert_eq!(
        td.get("/api/workflow/status/ghost").await.status().as_u16(),
        404
    );
    assert_eq!(
        td.post("/api/workflow/pause/ghost", serde_json::json!({}))
            .await
            .status()
            .as_u16(),
        404
    );
    assert_eq!(
        td.client
            .delete(format!("{}/api/workflow/abandon/ghost", td.base))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16(),
        404
    );
    assert_eq!(
        td.post(
            "/api/workflow/progress/ghost",
            serde_json::json!({"current_step": 1}),
        )
        .await
        .status()
        .as_u16(),
        404
    );

    td.daemon.stop().await;
}

#[tokio::test]
async fn progress_endpoint_updates_status_monotonically() {
    let td = boot_with_stub("sleep 2").await;
    let script = write_template(td.root.path(), "t.json");
    let started = td.start(serde_json::json!({ "script": script })).await;
    let id = started["workflow_id"].as_str().unwrap().to_string();

    for (step, name) in [(1, "init"), (2, "build"), (1, "stale")] {
        let response = td
            .post(
                &format!("/api/workflow/progress/{id}"),
                serde_json::json!({"current_step": step, "total_steps": 4, "step_name": name}),
            )
            .await;
        assert!(response.status().is_success());
    }

    let status = td.status(&id).await;
    // The stale report for step 1 did not roll progress back.
    assert_eq!(status["current_step"], 2);
    assert_eq!(status["total_steps"], 4);
    assert_eq!(status["step_name"], "build");

    td.daemon.stop().await;
}
