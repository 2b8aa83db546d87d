//! Integration tests for the OpenAI-compatible advisor
//!
//! Drives the advisor against a wiremock server to check request shape and
//! how each upstream failure is classified.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use sdk::types::Severity;
use triage_engine::config::OpenAIConfig;
use triage_engine::history::MemoryLog;
use triage_engine::llm::{openai::OpenAIAdvisor, Advisor, AdvisorError};
use triage_engine::secrets::SecretString;
use triage_engine::triage::{
    FallbackClassifier, FallbackReason, TriageEngine, TriagePath, DISCLAIMER,
};

fn advisor(base_url: &str, key: Option<&str>, timeout: Duration) -> OpenAIAdvisor {
    let config = OpenAIConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    OpenAIAdvisor::new(config, key.map(SecretString::from), timeout).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_tagged_reply_is_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "max_tokens": 300,
            "messages": [
                { "role": "system" },
                { "role": "user", "content": "Symptoms: runny nose" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "Rest, fluids and a humidifier should help.\n\nSEVERITY: MILD",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let configured = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5));
    assert!(configured.is_configured());

    let result = configured.advise("runny nose").await.unwrap();
    assert_eq!(result.severity, Severity::Mild);
    assert!(result
        .advice
        .starts_with("Rest, fluids and a humidifier should help."));
    assert!(result.advice.ends_with(DISCLAIMER));
    assert!(!result.advice.contains("SEVERITY"));
}

#[tokio::test]
async fn test_decorated_tag_is_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "Call emergency services now.\n**Severity:** Serious.",
        )))
        .mount(&mock_server)
        .await;

    let result = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5))
        .advise("crushing chest pain")
        .await
        .unwrap();
    assert_eq!(result.severity, Severity::Serious);
}

#[tokio::test]
async fn test_server_error_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&mock_server)
        .await;

    let err = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5))
        .advise("headache")
        .await
        .unwrap_err();

    match err {
        AdvisorError::UpstreamError(reason) => assert!(reason.contains("HTTP 500")),
        other => panic!("Expected UpstreamError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_body_is_scrubbed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            "Incorrect API key provided: sk-abcdefghijklmnopqrstuvwxyz123456",
        ))
        .mount(&mock_server)
        .await;

    let err = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5))
        .advise("headache")
        .await
        .unwrap_err();

    let AdvisorError::UpstreamError(reason) = err else {
        panic!("Expected UpstreamError");
    };
    assert!(reason.contains("HTTP 401"));
    assert!(reason.contains("[REDACTED]"));
    assert!(!reason.contains("sk-abcdefghijklmnopqrstuvwxyz123456"));
}

#[tokio::test]
async fn test_garbled_body_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock_server)
        .await;

    let err = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5))
        .advise("cough")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamError(_)));
}

#[tokio::test]
async fn test_missing_content_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&mock_server)
        .await;

    let err = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5))
        .advise("cough")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamError(_)));
}

#[tokio::test]
async fn test_untagged_reply_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Probably nothing to worry about.")),
        )
        .mount(&mock_server)
        .await;

    let err = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_secs(5))
        .advise("tired")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamError(_)));
}

#[tokio::test]
async fn test_slow_reply_times_out_as_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("Rest.\nSEVERITY: MILD"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let err = advisor(&mock_server.uri(), Some("sk-test-key"), Duration::from_millis(200))
        .advise("headache")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamError(_)));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    // Grab a free port, then release it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = advisor(
        &format!("http://127.0.0.1:{}", port),
        Some("sk-test-key"),
        Duration::from_secs(5),
    )
    .advise("headache")
    .await
    .unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_missing_key_never_calls_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let keyless = advisor(&mock_server.uri(), None, Duration::from_secs(5));
    assert!(!keyless.is_configured());

    let err = keyless.advise("headache").await.unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamUnavailable(_)));

    let blank = advisor(&mock_server.uri(), Some("   "), Duration::from_secs(5));
    assert!(!blank.is_configured());
}

#[tokio::test]
async fn test_engine_falls_back_when_upstream_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = TriageEngine::new(Arc::new(MemoryLog::new())).with_advisor(Arc::new(advisor(
        &mock_server.uri(),
        Some("sk-test-key"),
        Duration::from_secs(5),
    )));

    let request = sdk::types::TriageRequest::new("chest pain and difficulty breathing").unwrap();
    let outcome = engine.triage(&request).await;

    assert_eq!(
        outcome.path,
        TriagePath::Fallback(FallbackReason::UpstreamError)
    );
    assert_eq!(
        outcome.result,
        FallbackClassifier::new().classify("chest pain and difficulty breathing")
    );
    assert_eq!(outcome.result.severity, Severity::Serious);
}
