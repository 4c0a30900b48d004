//! End-to-end tests for the `hangouts-chat-handler` binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT: &str = r#"{
    "id": "8d3c5f4c-5f1b-4d8e-9a6a-1f0b2c3d4e5f",
    "entity": {"metadata": {"name": "foo", "namespace": "default"}},
    "check": {"metadata": {"name": "bar"}, "status": 1, "output": "Check OK"}
}"#;

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hangouts-chat-handler"))
        .args(args)
        .env_remove("HANGOUTSCHAT_WEBHOOK")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_missing_webhook_fails() {
    let output = run(&[], EVENT);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("webhook url for Hangouts Chat is empty"));
}

#[test]
fn test_malformed_event_fails() {
    let output = run(&["--webhook", "http://127.0.0.1:9/hook"], r#"{"entity": {}}"#);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse event"));
}

#[tokio::test]
async fn test_rejected_delivery_still_exits_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad card"))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = format!("{}/hook", server.uri());
    let output = tokio::task::spawn_blocking(move || run(&["--webhook", webhook.as_str()], EVENT))
        .await
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[tokio::test]
async fn test_body_template_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = format!("{}/hook", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        run(
            &[
                "--webhook",
                webhook.as_str(),
                "--descriptionTemplate",
                "{{Check.Output}}",
                "--descriptionLimit",
                "100",
            ],
            EVENT,
        )
    })
    .await
    .unwrap();
    assert!(output.status.success());

    let requests = server.received_requests().await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        payload["cards"][0]["sections"][2]["widgets"][0]["keyValue"]["content"],
        "Check OK"
    );
}
