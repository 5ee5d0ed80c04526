// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! I/O mediation scenarios: ordered output, FIFO input, bounded queues.

use super::prelude::*;

async fn started_workflow(td: &TestDaemon) -> String {
    let script = write_template(td.root.path(), "t.json");
    let started = td.start(serde_json::json!({ "script": script })).await;
    started["workflow_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn output_posts_concatenate_in_program_order() {
    let td = boot_with_stub("sleep 2").await;
    let id = started_workflow(&td).await;

    // The "executor" posts a sequence of chunks; flush boundaries may
    // batch but never reorder.
    let chunks = ["step-1a ", "step-1b\n", "step-2\n", "step-3\n"];
    for chunk in chunks {
        let response = td
            .post(
                &format!("/api/workflow/output?workflow_name={id}"),
                serde_json::json!({ "output": chunk }),
            )
            .await;
        assert!(response.status().is_success());
    }

    let body: serde_json::Value = td
        .get(&format!("/api/workflow/output?workflow_name={id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["output"], chunks.concat());

    // Drained means drained.
    let body: serde_json::Value = td
        .get(&format!("/api/workflow/output?workflow_name={id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["output"], "");

    td.daemon.stop().await;
}

#[tokio::test]
async fn input_is_fifo_and_poll_is_204_when_empty() {
    let td = boot_with_stub("sleep 2").await;
    let id = started_workflow(&td).await;

    // Nothing queued yet.
    let response = td
        .get(&format!("/api/workflow/input?workflow_name={id}"))
        .await;
    assert_eq!(response.status().as_u16(), 204);

    for line in ["first", "second", "third"] {
        let response = td
            .post(
                &format!("/api/workflow/input?workflow_name={id}"),
                serde_json::json!({ "input": line }),
            )
            .await;
        assert!(response.status().is_success());
    }

    for expected in ["first", "second", "third"] {
        let body: serde_json::Value = td
            .get(&format!("/api/workflow/input?workflow_name={id}"))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["input"], expected);
        assert_eq!(body["workflow_id"], id.as_str());
    }

    let response = td
        .get(&format!("/api/workflow/input?workflow_name={id}"))
        .await;
    assert_eq!(response.status().as_u16(), 204);

    td.daemon.stop().await;
}

#[tokio::test]
async fn input_queue_overflow_is_409() {
    let td = boot_with_stub("sleep 2").await;
    let id = started_workflow(&td).await;

    for i in 0..10 {
        let response = td
            .post(
                &format!("/api/workflow/input?workflow_name={id}"),
                serde_json::json!({ "input": format!("line-{i}") }),
            )
            .await;
        assert!(response.status().is_success(), "line {i}");
    }

    let response = td
        .post(
            &format!("/api/workflow/input?workflow_name={id}"),
            serde_json::json!({ "input": "overflow" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    td.daemon.stop().await;
}

#[tokio::test]
async fn io_endpoints_404_for_unknown_workflows() {
    let td = boot_with_stub("exit 0").await;

    assert_eq!(
        td.get("/api/workflow/input?workflow_name=ghost")
            .await
            .status()
            .as_u16(),
        404
    );
    assert_eq!(
        td.post(
            "/api/workflow/input?workflow_name=ghost",
            serde_json::json!({ "input": "x" }),
        )
        .await
        .status()
        .as_u16(),
        404
    );
    assert_eq!(
        td.get("/api/workflow/output?workflow_name=ghost")
            .await
            .status()
            .as_u16(),
        404
    );

    td.daemon.stop().await;
}

#[tokio::test]
async fn ci_query_round_trips_through_the_echo_provider() {
    let td = boot_with_stub("exit 0").await;

    let body: serde_json::Value = td
        .post(
            "/api/ci/query",
            serde_json::json!({ "query": "what is up", "provider": "echo" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["provider"], "echo");
    assert_eq!(body["response"], "what is up");

    let response = td
        .post(
            "/api/ci/query",
            serde_json::json!({ "query": "x", "provider": "nonsense" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    td.daemon.stop().await;
}
