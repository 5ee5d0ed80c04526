// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the spec suite.

use argo_daemon::{spawn_daemon, Config, DaemonHandle};
use argo_engine::LifecycleConfig;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

/// A booted daemon plus its scratch directory and an HTTP client.
pub struct TestDaemon {
    pub daemon: DaemonHandle,
    pub base: String,
    pub client: reqwest::Client,
    pub root: tempfile::TempDir,
}

/// Boot a daemon whose "executor" is a shell stub.
///
/// The stub runs via `/bin/sh`; `stub_body` is its script text. Exit
/// codes and sleeps are all the spec scenarios here need.
pub async fn boot_with_stub(stub_body: &str) -> TestDaemon {
    let root = tempfile::tempdir().unwrap();
    let stub = root.path().join("stub-executor.sh");
    std::fs::write(&stub, format!("#!/bin/sh\n{stub_body}\n")).unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = Config {
        root: root.path().to_path_buf(),
        host: "127.0.0.1".to_string(),
        port: 0,
        registry_path: root.path().join("registry.json"),
        lock_path: root.path().join("daemon.lock"),
        log_path: root.path().join("daemon.log"),
        logs_dir: root.path().join("logs"),
        checkpoints_dir: root.path().join("workflows").join("checkpoints"),
        executor_bin: stub,
        prune_age: Duration::from_secs(24 * 60 * 60),
        flush_interval: Duration::from_millis(100),
        shutdown_budget: Duration::from_secs(2),
        lifecycle: LifecycleConfig {
            completion_interval: Duration::from_millis(50),
            timeout_interval: Duration::from_millis(100),
            retry_delay_base: Duration::from_millis(100),
            ..LifecycleConfig::default()
        },
        ci_command: None,
    };
    let daemon = spawn_daemon(config).await.unwrap();
    let base = format!("http://{}", daemon.addr);
    TestDaemon {
        daemon,
        base,
        client: reqwest::Client::new(),
        root,
    }
}

/// Write a template file; stubs ignore it, but paths must be absolute
/// and real-looking.
pub fn write_template(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(
        &path,
        r#"{"name":"stub","steps":[{"id":"done","type":"exit"}]}"#,
    )
    .unwrap();
    path.display().to_string()
}

impl TestDaemon {
    pub async fn post(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }

    pub async fn start(&self, body: serde_json::Value) -> serde_json::Value {
        self.post("/api/workflow/start", body)
            .await
            .json()
            .await
            .unwrap()
    }

    pub async fn status(&self, id: &str) -> serde_json::Value {
        self.get(&format!("/api/workflow/status/{id}"))
            .await
            .json()
            .await
            .unwrap()
    }

    pub async fn wait_for_state(
        &self,
        id: &str,
        state: &str,
        budget: Duration,
    ) -> serde_json::Value {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            let status = self.status(id).await;
            if status["state"] == state {
                return status;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "workflow {id} stuck in {} waiting for {state}",
                status["state"]
            );
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}
