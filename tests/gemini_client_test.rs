use std::time::Duration;

use jivan::{ClientConfig, CompletionClient, FallbackMessages, GeminiClient, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(ClientConfig::gemini("test-key").with_base_url(server.uri())).unwrap()
}

fn candidate_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            {"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}
        ]
    })
}

#[test_log::test(tokio::test)]
async fn test_success_returns_first_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "What is dharma?"}]}],
            "generationConfig": {"temperature": 0.7, "maxOutputTokens": 1024}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("Dharma is righteous duty.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("What is dharma?").await.unwrap();
    assert_eq!(reply, "Dharma is righteous duty.");
}

#[test_log::test(tokio::test)]
async fn test_rate_limited_returns_busy_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().busy);
}

#[test_log::test(tokio::test)]
async fn test_unavailable_returns_unavailable_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().unavailable);
}

#[test_log::test(tokio::test)]
async fn test_other_status_returns_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {"message": "bad"}})))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[test_log::test(tokio::test)]
async fn test_empty_candidates_returns_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[test_log::test(tokio::test)]
async fn test_malformed_payload_returns_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[test_log::test(tokio::test)]
async fn test_connection_refused_returns_generic_message() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = GeminiClient::new(
        ClientConfig::gemini("test-key").with_base_url(format!("http://127.0.0.1:{}", port)),
    )
    .unwrap();

    let reply = client.complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[test_log::test(tokio::test)]
async fn test_timeout_returns_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate_body("late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        ClientConfig::gemini("test-key")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let reply = client.complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[test_log::test(tokio::test)]
async fn test_retries_unavailable_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("finally")))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_millis(10),
        ..RetryPolicy::default()
    };
    let client = GeminiClient::new(
        ClientConfig::gemini("test-key")
            .with_base_url(server.uri())
            .with_retry(retry),
    )
    .unwrap();

    assert_eq!(client.complete("q").await.unwrap(), "finally");
}

#[test_log::test(tokio::test)]
async fn test_custom_fallback_messages_are_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let fallbacks = FallbackMessages {
        busy: "Busy, please retry in a few minutes.".to_string(),
        ..FallbackMessages::default()
    };
    let client = GeminiClient::new(
        ClientConfig::gemini("test-key")
            .with_base_url(server.uri())
            .with_fallbacks(fallbacks),
    )
    .unwrap();

    assert_eq!(client.complete("q").await.unwrap(), "Busy, please retry in a few minutes.");
}
