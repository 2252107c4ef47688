//! Integration tests for `OllamaClient` using wiremock HTTP mocks.

use std::time::Duration;

use stockfeed_signals::{OllamaClient, SignalError, TextGenerator};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn generate_posts_non_streaming_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3",
            "prompt": "hello",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3",
            "response": "Strategy: Momentum Long\nReasoning: Strong tape.",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&format!("{}/", server.uri()), "llama3").expect("client");
    let reply = client
        .generate("hello", Duration::from_secs(5))
        .await
        .expect("generation should succeed");

    assert_eq!(reply, "Strategy: Momentum Long\nReasoning: Strong tape.");
}

#[tokio::test]
async fn generate_maps_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), "missing").expect("client");
    let err = client
        .generate("hello", Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, SignalError::Generator(_)), "got {err:?}");
}

#[tokio::test]
async fn generate_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "response": "late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), "llama3").expect("client");
    let err = client
        .generate("hello", Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, SignalError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn generate_rejects_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), "llama3").expect("client");
    let err = client
        .generate("hello", Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, SignalError::Generator(_)), "got {err:?}");
}

#[tokio::test]
async fn generate_rejects_body_without_response_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "model not loaded" })),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), "llama3").expect("client");
    let err = client
        .generate("hello", Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, SignalError::Generator(_)), "got {err:?}");
}
