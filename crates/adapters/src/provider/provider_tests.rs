// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn echo_returns_prompt() {
    let echo = EchoProvider::new();
    assert_eq!(echo.name(), "echo");
    assert_eq!(echo.query("hello there", None).await.unwrap(), "hello there");
}

#[tokio::test]
async fn registry_resolves_by_name_and_default() {
    let registry = ProviderRegistry::with_builtins();
    assert_eq!(registry.get(Some("echo")).unwrap().name(), "echo");
    assert_eq!(registry.get(None).unwrap().name(), "echo");
    assert_eq!(registry.get(Some("")).unwrap().name(), "echo");
}

#[tokio::test]
async fn registry_rejects_unknown_provider() {
    let registry = ProviderRegistry::with_builtins();
    let result = registry.get(Some("clippy-gpt"));
    assert!(matches!(result, Err(ProviderError::Unknown(name)) if name == "clippy-gpt"));
}

#[test]
fn first_registered_provider_becomes_default() {
    let mut registry = ProviderRegistry::new();
    registry.register(std::sync::Arc::new(FakeProvider::new()));
    assert_eq!(registry.names(), vec!["fake".to_string()]);
    assert_eq!(registry.get(None).unwrap().name(), "fake");
}

#[tokio::test]
async fn fake_provider_scripts_replies_and_records_prompts() {
    let fake = FakeProvider::new();
    fake.push_reply("first");
    fake.push_reply("second");

    assert_eq!(fake.query("q1", None).await.unwrap(), "first");
    assert_eq!(fake.query("q2", None).await.unwrap(), "second");
    // Script exhausted: echoes.
    assert_eq!(fake.query("q3", None).await.unwrap(), "fake: q3");
    assert_eq!(fake.prompts(), vec!["q1", "q2", "q3"]);
}

#[tokio::test]
async fn command_provider_round_trips_stdin_to_stdout() {
    let provider = CommandProvider::new("cat", "/bin/cat", vec![]);
    let reply = provider.query("prompt text", None).await.unwrap();
    assert_eq!(reply, "prompt text");
}

#[tokio::test]
async fn command_provider_missing_binary_is_unavailable() {
    let provider = CommandProvider::new("ghost", "/no/such/binary", vec![]);
    let result = provider.query("x", None).await;
    assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
}

#[tokio::test]
async fn command_provider_nonzero_exit_is_failure() {
    let provider = CommandProvider::new("false", "/bin/false", vec![]);
    let result = provider.query("x", None).await;
    assert!(matches!(result, Err(ProviderError::Failed { .. })));
}

#[tokio::test]
async fn command_provider_timeout() {
    let provider = CommandProvider::new("sleep", "/bin/sleep", vec!["30".to_string()])
        .with_timeout(Duration::from_millis(50));
    let result = provider.query("x", None).await;
    assert!(matches!(result, Err(ProviderError::Timeout { .. })));
}
